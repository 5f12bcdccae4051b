use super::{Key, MetricValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Summary statistics extracted from a distribution.
///
/// Produced fresh on every read and never mutated afterwards.  An empty
/// distribution reports all-zero fields; no field is ever NaN or infinite
/// unless a non-finite observation was recorded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// Number of observations.
    pub count: u64,
    /// Sum of all observations.
    pub sum: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance (squared deviations divided by count).
    pub variance: f64,
    /// Smallest observation.
    pub min: f64,
    /// Largest observation.
    pub max: f64,
}

impl Statistics {
    pub(crate) fn empty() -> Statistics {
        Statistics {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            variance: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 { self.variance.sqrt() }
}

impl Serialize for Statistics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("sum", &self.sum)?;
        map.serialize_entry("mean", &self.mean)?;
        map.serialize_entry("variance", &self.variance)?;
        map.serialize_entry("min", &self.min)?;
        map.serialize_entry("max", &self.max)?;
        map.end()
    }
}

/// A point-in-time view of every metric in a registry.
///
/// Values are collected one metric at a time; the snapshot as a whole is not
/// an atomic cut across metrics.  Keys iterate in sorted order so output is
/// deterministic.
#[derive(Default)]
pub struct Snapshot {
    values: BTreeMap<Key, MetricValue>,
}

impl Snapshot {
    pub(crate) fn set(&mut self, key: Key, value: MetricValue) {
        self.values.insert(key, value);
    }

    /// Gets the counter value for the given key.
    ///
    /// Returns `None` if the key has no counter value in this snapshot.
    pub fn counter(&self, key: &Key) -> Option<u64> {
        match self.values.get(key) {
            Some(MetricValue::Counter(value)) => Some(*value),
            _ => None,
        }
    }

    /// Gets the gauge value for the given key.
    ///
    /// Returns `None` if the key has no gauge value in this snapshot.
    pub fn gauge(&self, key: &Key) -> Option<i64> {
        match self.values.get(key) {
            Some(MetricValue::Gauge(value)) => Some(*value),
            _ => None,
        }
    }

    /// Gets the label text for the given key.
    ///
    /// Returns `None` if the key has no label value in this snapshot.
    pub fn label(&self, key: &Key) -> Option<&str> {
        match self.values.get(key) {
            Some(MetricValue::Label(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Gets the distribution statistics for the given key.
    ///
    /// Returns `None` if the key has no distribution value in this snapshot.
    pub fn distribution(&self, key: &Key) -> Option<Statistics> {
        match self.values.get(key) {
            Some(MetricValue::Distribution(stats)) => Some(*stats),
            _ => None,
        }
    }

    /// Number of metrics captured in this snapshot.
    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Iterates over all captured metrics, in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &MetricValue)> { self.values.iter() }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            let name = key.to_string();
            match value {
                MetricValue::Counter(v) => map.serialize_entry(&name, v)?,
                MetricValue::Gauge(v) => map.serialize_entry(&name, v)?,
                MetricValue::Label(v) => map.serialize_entry(&name, v)?,
                MetricValue::Distribution(v) => map.serialize_entry(&name, v)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{Snapshot, Statistics};
    use crate::data::{Key, MetricValue};

    #[test]
    fn test_snapshot_set_and_get() {
        let mut snapshot = Snapshot::default();
        snapshot.set(Key::from_name("requests"), MetricValue::Counter(42));
        snapshot.set(Key::from_name("connections"), MetricValue::Gauge(-3));
        snapshot.set(
            Key::from_name("version"),
            MetricValue::Label("v1.2.3".to_owned()),
        );

        assert_eq!(snapshot.counter(&Key::from_name("requests")), Some(42));
        assert_eq!(snapshot.gauge(&Key::from_name("connections")), Some(-3));
        assert_eq!(snapshot.label(&Key::from_name("version")), Some("v1.2.3"));
        assert_eq!(snapshot.len(), 3);

        // Kind-mismatched lookups return nothing.
        assert_eq!(snapshot.gauge(&Key::from_name("requests")), None);
        assert_eq!(snapshot.counter(&Key::from_name("missing")), None);
    }

    #[test]
    fn test_snapshot_distribution() {
        let stats = Statistics {
            count: 10,
            sum: 55.0,
            mean: 5.5,
            variance: 8.25,
            min: 1.0,
            max: 10.0,
        };

        let mut snapshot = Snapshot::default();
        snapshot.set(Key::from_name("latency"), MetricValue::Distribution(stats));

        let read = snapshot.distribution(&Key::from_name("latency")).unwrap();
        assert_eq!(read, stats);
        assert!((read.std_dev() - 8.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serialize() {
        let mut snapshot = Snapshot::default();
        snapshot.set(Key::from_name("requests"), MetricValue::Counter(7));
        snapshot.set(
            Key::with_tags("hits", vec![("route".to_owned(), "/".to_owned())]),
            MetricValue::Counter(3),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"hits{route=\"/\"}":3,"requests":7}"#);
    }
}
