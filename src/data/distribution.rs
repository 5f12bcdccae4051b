use super::snapshot::Statistics;
use crate::lock::SpinLock;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Running aggregate of one stripe: count, mean, sum of squared deviations
/// from the mean, sum, min, and max.
///
/// At rest the six fields always jointly describe a valid aggregate of some
/// finite multiset of observations.  The identity element (count 0, min +inf,
/// max -inf) is neutral under `merge` and never leaks to callers.
#[derive(Clone, Copy, Debug)]
struct StripeState {
    count: u64,
    mean: f64,
    m2: f64,
    sum: f64,
    min: f64,
    max: f64,
}

impl StripeState {
    fn identity() -> StripeState {
        StripeState {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Combines this aggregate with another, in place.
    ///
    /// This is the parallel (Chan) generalization of Welford's online
    /// algorithm: two weighted batches merge in O(1) without revisiting
    /// individual observations, and without the catastrophic cancellation of
    /// the naive sum-of-squares formula.
    fn merge(&mut self, other: &StripeState) {
        let count = self.count + other.count;
        if count == 0 {
            return;
        }

        let n1 = self.count as f64;
        let n2 = other.count as f64;
        let n = count as f64;

        let delta = other.mean - self.mean;
        self.mean += delta * n2 / n;
        self.m2 += other.m2 + delta * delta * n1 * n2 / n;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count = count;
    }

    /// Folds `weight` occurrences of `value` into this aggregate.
    ///
    /// Equivalent to merging with the batch `(weight, value, 0,
    /// value * weight, value, value)`.  Pure arithmetic over the fields; no
    /// allocation, no failure path.
    fn update(&mut self, value: f64, weight: u64) {
        let batch = StripeState {
            count: weight,
            mean: value,
            m2: 0.0,
            sum: value * weight as f64,
            min: value,
            max: value,
        };
        self.merge(&batch);
    }

    /// Converts the folded aggregate into an externally visible summary.
    ///
    /// An empty aggregate reports all-zero fields, suppressing the ±inf
    /// sentinels and the 0/0 variance so downstream consumers never see a
    /// non-finite float they didn't feed in themselves.
    fn finish(&self) -> Statistics {
        if self.count == 0 {
            return Statistics::empty();
        }

        Statistics {
            count: self.count,
            sum: self.sum,
            mean: self.mean,
            variance: self.m2 / self.count as f64,
            min: self.min,
            max: self.max,
        }
    }
}

/// One independently-locked partial aggregate.
///
/// The lock word is embedded directly next to the fields it guards, so an
/// update touches exactly one cache-padded record, pointer-free and
/// allocation-free.
struct Stripe {
    lock: SpinLock,
    state: UnsafeCell<StripeState>,
}

// The spinlock serializes every access to `state`.
unsafe impl Sync for Stripe {}

impl Stripe {
    fn new() -> Stripe {
        Stripe {
            lock: SpinLock::new(),
            state: UnsafeCell::new(StripeState::identity()),
        }
    }

    fn update(&self, value: f64, weight: u64) {
        self.lock.acquire();
        unsafe {
            (*self.state.get()).update(value, weight);
        }
        self.lock.release();
    }

    /// Copies the six fields out under the lock.  The copy is immutable and
    /// safe to read without further synchronization.
    fn snapshot(&self) -> StripeState {
        self.lock.acquire();
        let copied = unsafe { *self.state.get() };
        self.lock.release();
        copied
    }
}

// Writer slots are handed out round-robin, process-wide, and cached per
// thread.  Concurrent writers therefore usually land on different stripes.
static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static SLOT: usize = NEXT_SLOT.fetch_add(1, Ordering::Relaxed);
}

/// A concurrent accumulator of floating-point observations.
///
/// Many threads record observations at high frequency while a reader
/// periodically extracts count, sum, mean, variance, min, and max.  Write
/// contention is spread across an array of stripes, one per logical CPU by
/// default; a writer spins only on its own stripe's lock and never allocates
/// on the hot path.
///
/// No validation of observed values is performed: NaN and infinity are
/// accepted and will poison subsequent statistics, matching the
/// fire-and-forget contract of metrics recording.
pub struct Distribution {
    stripes: Box<[CachePadded<Stripe>]>,
}

impl Distribution {
    /// Creates a distribution with one stripe per logical CPU.
    pub fn new() -> Distribution { Distribution::with_stripes(num_cpus::get()) }

    /// Creates a distribution with a fixed number of stripes, minimum 1.
    ///
    /// The stripe array is sized once here and never resized.
    pub fn with_stripes(stripe_count: usize) -> Distribution {
        let stripe_count = stripe_count.max(1);
        let stripes = (0..stripe_count)
            .map(|_| CachePadded::new(Stripe::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Distribution { stripes }
    }

    /// Records a single observation.
    pub fn add(&self, value: f64) { self.add_n(value, 1); }

    /// Records `count` repeat occurrences of `value`.
    ///
    /// A zero count is a no-op.  Calls landing on different stripes proceed
    /// fully in parallel; calls landing on the same stripe serialize via that
    /// stripe's lock.
    pub fn add_n(&self, value: f64, count: u64) {
        if count == 0 {
            return;
        }

        let index = SLOT.with(|slot| *slot) % self.stripes.len();
        self.stripes[index].update(value, count);
    }

    /// Reads the combined statistics across all stripes.
    ///
    /// Stripes are snapshotted one at a time, in index order, with at most
    /// one stripe locked at any moment, then folded into a single aggregate.
    /// The result is a valid combination of independently-consistent partial
    /// states, not a frozen instant-in-time view: a stripe may be updated
    /// after an earlier stripe was snapshotted but before the fold completes.
    pub fn read(&self) -> Statistics {
        let mut total = StripeState::identity();
        for stripe in self.stripes.iter() {
            let partial = stripe.snapshot();
            total.merge(&partial);
        }

        total.finish()
    }
}

impl Default for Distribution {
    fn default() -> Distribution { Distribution::new() }
}
