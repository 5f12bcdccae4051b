use std::hint;
use std::sync::atomic::{AtomicUsize, Ordering};

const FREE: usize = 0;
const HELD: usize = 1;

/// A single-word spinlock.
///
/// Guards one stripe's statistics fields.  Acquisition busy-waits on a
/// compare-and-swap with a processor pause between attempts; there is no
/// kernel involvement and no allocation on either path.  Critical sections
/// guarded by this lock must be short, pure arithmetic over primitive
/// fields, so that release happens on every exit path.
pub(crate) struct SpinLock {
    state: AtomicUsize,
}

impl SpinLock {
    pub(crate) fn new() -> SpinLock {
        SpinLock {
            state: AtomicUsize::new(FREE),
        }
    }

    /// Spins until the lock is taken.
    pub(crate) fn acquire(&self) {
        loop {
            if self
                .state
                .compare_exchange_weak(FREE, HELD, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }

            // Wait for the word to look free before retrying the CAS, so
            // contending threads spin on a shared read instead of ping-ponging
            // the cache line with failed writes.
            while self.state.load(Ordering::Relaxed) == HELD {
                hint::spin_loop();
            }
        }
    }

    /// Releases the lock, publishing all writes made while it was held.
    pub(crate) fn release(&self) { self.state.store(FREE, Ordering::Release); }
}
