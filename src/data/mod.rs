use std::fmt::{self, Display};

pub mod counter;
pub mod distribution;
pub mod gauge;
pub mod label;
pub mod snapshot;

pub use self::{
    counter::Counter,
    distribution::Distribution,
    gauge::Gauge,
    label::Label,
    snapshot::{Snapshot, Statistics},
};

/// A metric identifier: a name plus optional key/value tags.
///
/// Tags are kept sorted so that two keys built from the same pairs in any
/// order compare and hash equal.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Key {
    name: String,
    tags: Vec<(String, String)>,
}

impl Key {
    /// Creates a key with no tags.
    pub fn from_name<S: Into<String>>(name: S) -> Key {
        Key {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    /// Creates a key with the given tag pairs.
    pub fn with_tags<S: Into<String>>(name: S, mut tags: Vec<(String, String)>) -> Key {
        tags.sort();
        Key {
            name: name.into(),
            tags,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    /// The tag pairs, in sorted order.
    pub fn tags(&self) -> &[(String, String)] { &self.tags }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.tags.is_empty() {
            return write!(f, "{}", self.name);
        }

        write!(f, "{}{{", self.name)?;
        for (i, (tag, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}=\"{}\"", tag, value)?;
        }
        write!(f, "}}")
    }
}

/// A sampled metric value, as captured into a [`Snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    /// A monotonic counter reading.
    Counter(u64),

    /// An instantaneous gauge reading.
    Gauge(i64),

    /// A text label reading.
    Label(String),

    /// Summary statistics folded out of a distribution.
    Distribution(Statistics),
}
