use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
///
/// A single atomic word; increments are relaxed, lock-free, and
/// allocation-free.  No striping is needed because a fetch-add never
/// serializes writers behind a lock.
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Counter {
        Counter {
            value: AtomicU64::new(0),
        }
    }

    /// Increments the counter by one.
    pub fn increment(&self) { self.add(1); }

    /// Increments the counter by `n`.
    pub fn add(&self, n: u64) { self.value.fetch_add(n, Ordering::Relaxed); }

    /// Reads the current value.
    pub fn value(&self) -> u64 { self.value.load(Ordering::Relaxed) }
}

impl Default for Counter {
    fn default() -> Counter { Counter::new() }
}

#[cfg(test)]
mod tests {
    use super::Counter;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_simple() {
        let counter = Counter::new();
        assert_eq!(counter.value(), 0);

        counter.increment();
        counter.add(41);
        assert_eq!(counter.value(), 42);
    }

    #[test]
    fn test_counter_concurrent() {
        let counter = Arc::new(Counter::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        counter.increment();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.value(), 40_000);
    }
}
