use crate::data::{Counter, Distribution, Gauge, Key, Label, MetricValue, Snapshot};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A registered metric cell.
enum Entry {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Label(Arc<Label>),
    Distribution(Arc<Distribution>),
}

impl Entry {
    fn sample(&self) -> MetricValue {
        match self {
            Entry::Counter(counter) => MetricValue::Counter(counter.value()),
            Entry::Gauge(gauge) => MetricValue::Gauge(gauge.value()),
            Entry::Label(label) => MetricValue::Label(label.value()),
            Entry::Distribution(distribution) => MetricValue::Distribution(distribution.read()),
        }
    }
}

type GroupSampler = Box<dyn Fn() -> Vec<(Key, MetricValue)> + Send + Sync>;

struct Group {
    id: usize,
    sampler: GroupSampler,
}

/// Handle for deregistering a previously registered group.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GroupId(usize);

/// The shared metric store.
///
/// A registry is explicitly constructed and explicitly owned -- typically
/// created once at startup, shared via `Arc`, and dropped at shutdown.  It is
/// never an implicit process-wide global.
///
/// Writers hold the `Arc` handles returned at registration and never touch
/// the registry map on the hot path.  Registering an existing key under a
/// different metric kind replaces the previous entry, last registration
/// wins.
pub struct Registry {
    stripe_count: usize,
    metrics: RwLock<HashMap<Key, Entry, FnvBuildHasher>>,
    groups: RwLock<Vec<Group>>,
    next_group_id: AtomicUsize,
}

impl Registry {
    /// Creates a registry whose distributions get one stripe per logical CPU.
    ///
    /// The parallelism probe happens once, here, and is never re-evaluated.
    pub fn new() -> Registry { Registry::with_stripes(num_cpus::get()) }

    /// Creates a registry whose distributions get a fixed stripe count.
    pub fn with_stripes(stripe_count: usize) -> Registry {
        Registry {
            stripe_count: stripe_count.max(1),
            metrics: RwLock::new(HashMap::default()),
            groups: RwLock::new(Vec::new()),
            next_group_id: AtomicUsize::new(0),
        }
    }

    /// Gets or registers the counter for the given key.
    pub fn counter(&self, key: Key) -> Arc<Counter> {
        let mut metrics = self.metrics.write();
        if let Some(Entry::Counter(counter)) = metrics.get(&key) {
            return counter.clone();
        }

        let counter = Arc::new(Counter::new());
        metrics.insert(key, Entry::Counter(counter.clone()));
        counter
    }

    /// Gets or registers the gauge for the given key.
    pub fn gauge(&self, key: Key) -> Arc<Gauge> {
        let mut metrics = self.metrics.write();
        if let Some(Entry::Gauge(gauge)) = metrics.get(&key) {
            return gauge.clone();
        }

        let gauge = Arc::new(Gauge::new());
        metrics.insert(key, Entry::Gauge(gauge.clone()));
        gauge
    }

    /// Gets or registers the label for the given key.
    pub fn label(&self, key: Key) -> Arc<Label> {
        let mut metrics = self.metrics.write();
        if let Some(Entry::Label(label)) = metrics.get(&key) {
            return label.clone();
        }

        let label = Arc::new(Label::new());
        metrics.insert(key, Entry::Label(label.clone()));
        label
    }

    /// Gets or registers the distribution for the given key.
    pub fn distribution(&self, key: Key) -> Arc<Distribution> {
        let mut metrics = self.metrics.write();
        if let Some(Entry::Distribution(distribution)) = metrics.get(&key) {
            return distribution.clone();
        }

        let distribution = Arc::new(Distribution::with_stripes(self.stripe_count));
        metrics.insert(key, Entry::Distribution(distribution.clone()));
        distribution
    }

    /// Registers a group of metrics sampled by one shared call.
    ///
    /// Some sources hand out several related readings in a single probe --
    /// allocator or GC statistics, for example.  Rather than registering a
    /// cell per reading, a group supplies all of its key/value pairs at once
    /// each time the registry is sampled.
    pub fn register_group<F>(&self, sampler: F) -> GroupId
    where
        F: Fn() -> Vec<(Key, MetricValue)> + Send + Sync + 'static,
    {
        let id = self.next_group_id.fetch_add(1, Ordering::Relaxed);
        let mut groups = self.groups.write();
        groups.push(Group {
            id,
            sampler: Box::new(sampler),
        });

        GroupId(id)
    }

    /// Removes a previously registered group.
    ///
    /// Returns whether the group was present.
    pub fn deregister_group(&self, id: GroupId) -> bool {
        let mut groups = self.groups.write();
        let before = groups.len();
        groups.retain(|group| group.id != id.0);
        groups.len() != before
    }

    /// Removes the metric registered under the given key.
    ///
    /// Returns whether the key was present.  The cell itself stays alive for
    /// as long as writers hold their `Arc` handles; it simply stops being
    /// sampled.
    pub fn deregister(&self, key: &Key) -> bool {
        let mut metrics = self.metrics.write();
        metrics.remove(key).is_some()
    }

    /// Removes several metrics in one step.
    ///
    /// All removals happen under a single write lock, so no sample pass can
    /// observe a partially deregistered batch.
    pub fn deregister_all(&self, keys: &[Key]) {
        let mut metrics = self.metrics.write();
        for key in keys {
            let _ = metrics.remove(key);
        }
    }

    /// Samples every registered metric and group into a [`Snapshot`].
    ///
    /// Metrics are read one at a time; the snapshot is consistent per metric
    /// but not atomic across metrics.
    pub fn sample(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();

        {
            let metrics = self.metrics.read();
            for (key, entry) in metrics.iter() {
                snapshot.set(key.clone(), entry.sample());
            }
        }

        {
            let groups = self.groups.read();
            for group in groups.iter() {
                for (key, value) in (group.sampler)() {
                    snapshot.set(key, value);
                }
            }
        }

        snapshot
    }
}

impl Default for Registry {
    fn default() -> Registry { Registry::new() }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::data::{Key, MetricValue};
    use std::sync::Arc;

    #[test]
    fn test_registration_idempotent() {
        let registry = Registry::new();

        let a = registry.counter(Key::from_name("requests"));
        let b = registry.counter(Key::from_name("requests"));
        assert!(Arc::ptr_eq(&a, &b));

        a.add(3);
        assert_eq!(b.value(), 3);
    }

    #[test]
    fn test_sample_all_kinds() {
        let registry = Registry::new();

        registry.counter(Key::from_name("requests")).add(42);
        registry.gauge(Key::from_name("connections")).set(-3);
        registry.label(Key::from_name("version")).set("v1.0.0");

        let latency = registry.distribution(Key::from_name("latency"));
        for i in 1..=10 {
            latency.add(i as f64);
        }

        let snapshot = registry.sample();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.counter(&Key::from_name("requests")), Some(42));
        assert_eq!(snapshot.gauge(&Key::from_name("connections")), Some(-3));
        assert_eq!(snapshot.label(&Key::from_name("version")), Some("v1.0.0"));

        let stats = snapshot.distribution(&Key::from_name("latency")).unwrap();
        assert_eq!(stats.count, 10);
        assert!((stats.mean - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_group_sampling() {
        let registry = Registry::new();

        let id = registry.register_group(|| {
            vec![
                (Key::from_name("gc.collections"), MetricValue::Counter(7)),
                (Key::from_name("gc.live_bytes"), MetricValue::Gauge(1024)),
            ]
        });

        let snapshot = registry.sample();
        assert_eq!(snapshot.counter(&Key::from_name("gc.collections")), Some(7));
        assert_eq!(snapshot.gauge(&Key::from_name("gc.live_bytes")), Some(1024));

        assert!(registry.deregister_group(id));
        assert!(!registry.deregister_group(id));

        let snapshot = registry.sample();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_deregister() {
        let registry = Registry::new();

        let counter = registry.counter(Key::from_name("requests"));
        assert!(registry.deregister(&Key::from_name("requests")));
        assert!(!registry.deregister(&Key::from_name("requests")));

        // The handle stays usable; the cell just stops being sampled.
        counter.increment();
        assert!(registry.sample().is_empty());
    }

    #[test]
    fn test_deregister_all() {
        let registry = Registry::new();

        registry.counter(Key::from_name("a"));
        registry.gauge(Key::from_name("b"));
        registry.counter(Key::from_name("keep"));

        registry.deregister_all(&[Key::from_name("a"), Key::from_name("b")]);

        let snapshot = registry.sample();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.counter(&Key::from_name("keep")), Some(0));
    }

    #[test]
    fn test_rekind_replaces() {
        let registry = Registry::new();

        registry.counter(Key::from_name("m")).add(5);
        registry.gauge(Key::from_name("m")).set(-1);

        let snapshot = registry.sample();
        assert_eq!(snapshot.counter(&Key::from_name("m")), None);
        assert_eq!(snapshot.gauge(&Key::from_name("m")), Some(-1));
    }
}
