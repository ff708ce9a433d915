//! Per-worker phase counters for neighbor-only (fuzzy) barriers.
//!
//! A global barrier makes every worker wait for the slowest one. A
//! [`PhaseCounter`] instead lets each worker publish how many iterations it
//! has completed, and lets the workers that actually depend on it block until
//! that count reaches a given phase. Each worker owns one counter, so waits
//! only contend with the owner and its declared neighbors.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Monotonically increasing count of completed phases with a blocking wait.
///
/// Everything the owner wrote before [`PhaseCounter::arrive`] is visible to a
/// thread that returns from [`PhaseCounter::wait_for`] for that phase.
///
/// # Examples
///
/// ```rust
/// use phaser_kernels::PhaseCounter;
///
/// let counter = PhaseCounter::new();
/// std::thread::scope(|s| {
///     s.spawn(|| {
///         counter.arrive();
///         counter.arrive();
///     });
///     counter.wait_for(2);
/// });
/// assert_eq!(counter.completed(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PhaseCounter {
    completed: Mutex<usize>,
    advanced: Condvar,
}

impl PhaseCounter {
    /// A counter with no completed phases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one more phase complete and wake all waiters.
    ///
    /// Returns the new number of completed phases.
    pub fn arrive(&self) -> usize {
        let mut completed = self.lock();
        *completed += 1;
        let phase = *completed;
        drop(completed);
        self.advanced.notify_all();
        phase
    }

    /// Block until at least `phase` phases have completed.
    pub fn wait_for(&self, phase: usize) {
        let completed = self.lock();
        let _completed = self
            .advanced
            .wait_while(completed, |completed| *completed < phase)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Number of phases completed so far.
    pub fn completed(&self) -> usize {
        *self.lock()
    }

    // The counter is a plain integer that is never left half-updated, so a
    // poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
