use std::sync::atomic::{AtomicI64, Ordering};

/// An instantaneous signed value.
///
/// Gauges operate in last-write-wins mode and may move in either direction.
/// Like the counter, a gauge is a single atomic word with no locking and no
/// allocation on any path.
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Gauge {
        Gauge {
            value: AtomicI64::new(0),
        }
    }

    /// Sets the gauge to `value`.
    pub fn set(&self, value: i64) { self.value.store(value, Ordering::Relaxed); }

    /// Increments the gauge by one.
    pub fn increment(&self) { self.value.fetch_add(1, Ordering::Relaxed); }

    /// Decrements the gauge by one.
    pub fn decrement(&self) { self.value.fetch_sub(1, Ordering::Relaxed); }

    /// Reads the current value.
    pub fn value(&self) -> i64 { self.value.load(Ordering::Relaxed) }
}

impl Default for Gauge {
    fn default() -> Gauge { Gauge::new() }
}
