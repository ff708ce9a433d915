//! Task spawning and shared-buffer plumbing for the parallel kernels.
//!
//! [`fork`] starts a unit of work on its own scoped thread and hands back a
//! [`Task`] whose [`Task::join`] blocks until the result is available. Tasks
//! never outlive the [`std::thread::scope`] they were forked in, so every
//! kernel call joins all of its workers before returning.

use std::marker::PhantomData;
use std::thread::{Scope, ScopedJoinHandle};

/// Handle to a forked unit of work.
///
/// Dropping a handle without joining it is allowed; the enclosing scope still
/// waits for the thread, but its result (and any panic) is only observed
/// through [`Task::join`].
#[must_use = "a forked task should be joined to observe its result"]
pub struct Task<'scope, T> {
    handle: ScopedJoinHandle<'scope, T>,
}

impl<'scope, T> Task<'scope, T> {
    /// Block until the task finishes and return its value.
    ///
    /// A panic inside the task is resumed on the joining thread.
    pub fn join(self) -> T {
        match self.handle.join() {
            Ok(value) => value,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Whether the task has already produced its value.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Run `f` in parallel with the caller and return a handle to its result.
///
/// # Examples
///
/// ```rust
/// use phaser_kernels::fork;
///
/// let data = [1.0, 2.0, 3.0, 4.0];
/// let total = std::thread::scope(|s| {
///     let left = fork(s, || data[..2].iter().sum::<f64>());
///     let right: f64 = data[2..].iter().sum();
///     left.join() + right
/// });
/// assert_eq!(total, 10.0);
/// ```
pub fn fork<'scope, 'env, F, T>(scope: &'scope Scope<'scope, 'env>, f: F) -> Task<'scope, T>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    Task {
        handle: scope.spawn(f),
    }
}

/// Evaluate `a` and `b`, potentially in parallel, and return both results.
///
/// With the `parallel` feature this is `rayon::join`; otherwise `a` runs
/// before `b` on the calling thread.
#[inline]
pub(crate) fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        rayon::join(a, b)
    }
    #[cfg(not(feature = "parallel"))]
    {
        (a(), b())
    }
}

/// A raw view of a caller buffer that may be shared across worker threads.
///
/// # Safety
/// The creator must keep the underlying slice mutably borrowed for as long as
/// any copy is in use, and callers of [`SharedSlice::read`] and
/// [`SharedSlice::write`] must guarantee that no cell is written while another
/// thread reads or writes it. The averaging kernels get this from chunk
/// ownership plus the barrier / phase-counter happens-before edges.
pub(crate) struct SharedSlice<'a, T> {
    ptr: *mut T,
    len: usize,
    _borrow: PhantomData<&'a mut [T]>,
}

impl<T> Clone for SharedSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedSlice<'_, T> {}

unsafe impl<T: Send> Send for SharedSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for SharedSlice<'_, T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _borrow: PhantomData,
        }
    }

    /// # Safety
    /// `index < len`, and no thread writes `index` concurrently.
    #[inline]
    pub(crate) unsafe fn read(self, index: usize) -> T {
        debug_assert!(index < self.len);
        *self.ptr.add(index)
    }

    /// # Safety
    /// `index < len`, and no other thread accesses `index` concurrently.
    #[inline]
    pub(crate) unsafe fn write(self, index: usize, value: T) {
        debug_assert!(index < self.len);
        *self.ptr.add(index) = value;
    }
}
