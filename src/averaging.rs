//! Iterative 1-D Jacobi averaging over a pair of ping-pong buffers.
//!
//! Both buffers hold `n` interior cells at indices `1..=n` between two
//! boundary cells `0` and `n + 1`. Each iteration computes
//!
//! ```text
//! write[j] = (read[j - 1] + read[j + 1]) / 2    for j in 1..=n
//! ```
//!
//! Iteration 0 reads `curr` and writes `next`, and the roles alternate after
//! every iteration. Boundary cells are never written, so callers seed them in
//! both buffers. After the run, [`ResultBuffer::after`] names the buffer that
//! holds the last iteration's output.
//!
//! The parallel strategies give every worker one contiguous chunk of interior
//! cells (see [`crate::partition_chunk`]). A worker writes only its own chunk
//! and reads one cell past each end, which belongs to the adjacent worker.
//! Those cross-chunk reads are ordered after the neighbor's writes either by a
//! global [`Barrier`] or by the neighbor's [`PhaseCounter`].

use std::ops::Range;
use std::sync::Barrier;

use num_traits::Float;
use tracing::{instrument, trace};

use crate::partition::chunk_ranges;
use crate::phase::PhaseCounter;
use crate::threading::{fork, SharedSlice};
use crate::{KernelError, Result};

/// Which caller buffer holds the final values after an averaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBuffer {
    /// The `next` argument (odd iteration counts).
    Next,
    /// The `curr` argument (even iteration counts, including zero).
    Curr,
}

impl ResultBuffer {
    /// The buffer written by the last of `iterations` iterations.
    ///
    /// ```rust
    /// use phaser_kernels::ResultBuffer;
    ///
    /// assert_eq!(ResultBuffer::after(0), ResultBuffer::Curr);
    /// assert_eq!(ResultBuffer::after(3), ResultBuffer::Next);
    /// ```
    pub fn after(iterations: usize) -> Self {
        if iterations % 2 == 1 {
            ResultBuffer::Next
        } else {
            ResultBuffer::Curr
        }
    }

    /// Pick the matching buffer out of `(next, curr)`.
    pub fn select<'a, T>(self, next: &'a [T], curr: &'a [T]) -> &'a [T] {
        match self {
            ResultBuffer::Next => next,
            ResultBuffer::Curr => curr,
        }
    }
}

/// How [`run_averaging`] coordinates its workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingStrategy {
    /// Single-threaded reference sweep.
    Sequential,
    /// All workers meet at one barrier after every iteration.
    GlobalBarrier { tasks: usize },
    /// Each worker waits only for its left and right neighbors.
    FuzzyBarrier { tasks: usize },
}

/// Run `iterations` averaging steps with the given strategy.
pub fn run_averaging<T>(
    strategy: AveragingStrategy,
    iterations: usize,
    next: &mut [T],
    curr: &mut [T],
    n: usize,
) -> Result<ResultBuffer>
where
    T: Float + Send + Sync,
{
    match strategy {
        AveragingStrategy::Sequential => run_averaging_sequential(iterations, next, curr, n),
        AveragingStrategy::GlobalBarrier { tasks } => {
            run_averaging_global_barrier(iterations, next, curr, n, tasks)
        }
        AveragingStrategy::FuzzyBarrier { tasks } => {
            run_averaging_fuzzy_barrier(iterations, next, curr, n, tasks)
        }
    }
}

/// Reference implementation on the calling thread.
pub fn run_averaging_sequential<T: Float>(
    iterations: usize,
    next: &mut [T],
    curr: &mut [T],
    n: usize,
) -> Result<ResultBuffer> {
    check_buffers(next, curr, n)?;

    let mut parity = Parity::ReadCurr;
    for _ in 0..iterations {
        match parity {
            Parity::ReadCurr => sweep(curr, next, 1..n + 1),
            Parity::ReadNext => sweep(next, curr, 1..n + 1),
        }
        parity = parity.flip();
    }
    Ok(ResultBuffer::after(iterations))
}

/// Parallel averaging with a global barrier between iterations.
///
/// Spawns `tasks` workers. Every worker sweeps its chunk and then waits until
/// all `tasks` workers have finished the same iteration before starting the
/// next one.
#[instrument(level = "debug", skip(next, curr))]
pub fn run_averaging_global_barrier<T>(
    iterations: usize,
    next: &mut [T],
    curr: &mut [T],
    n: usize,
    tasks: usize,
) -> Result<ResultBuffer>
where
    T: Float + Send + Sync,
{
    let chunks = interior_chunks(tasks, n)?;
    check_buffers(next, curr, n)?;

    let buffers = Buffers::new(next, curr);
    let barrier = Barrier::new(tasks);
    let barrier = &barrier;

    std::thread::scope(|s| {
        let workers: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(worker, cells)| {
                fork(s, move || {
                    let mut parity = Parity::ReadCurr;
                    for iter in 0..iterations {
                        let (read, write) = buffers.roles(parity);
                        // SAFETY: this worker is the only writer of `cells`.
                        // Other workers read `write` only in the next
                        // iteration, which every worker enters after the
                        // barrier below, and nobody writes `read` before the
                        // barrier either.
                        unsafe { sweep_shared(read, write, cells.clone()) };
                        trace!(worker, iter, "chunk swept");
                        barrier.wait();
                        parity = parity.flip();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join();
        }
    });

    Ok(ResultBuffer::after(iterations))
}

/// Parallel averaging with a fuzzy (neighbor-only) barrier.
///
/// Worker `i` owns a [`PhaseCounter`] counting the iterations it has
/// completed. After sweeping iteration `k` it arrives on its own counter
/// (which becomes `k + 1`) and waits until the counters of workers `i - 1`
/// and `i + 1`, where they exist, also reach `k + 1`. Workers that are not
/// adjacent are never synchronized directly and may be several iterations
/// apart, while adjacent workers are at most one iteration apart.
#[instrument(level = "debug", skip(next, curr))]
pub fn run_averaging_fuzzy_barrier<T>(
    iterations: usize,
    next: &mut [T],
    curr: &mut [T],
    n: usize,
    tasks: usize,
) -> Result<ResultBuffer>
where
    T: Float + Send + Sync,
{
    let chunks = interior_chunks(tasks, n)?;
    check_buffers(next, curr, n)?;

    let buffers = Buffers::new(next, curr);
    let counters: Vec<PhaseCounter> = (0..tasks).map(|_| PhaseCounter::new()).collect();
    let counters = counters.as_slice();

    std::thread::scope(|s| {
        let workers: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(worker, cells)| {
                let own = &counters[worker];
                let left = worker.checked_sub(1).map(|i| &counters[i]);
                let right = counters.get(worker + 1);
                fork(s, move || {
                    let mut parity = Parity::ReadCurr;
                    for iter in 0..iterations {
                        let (read, write) = buffers.roles(parity);
                        // SAFETY: this worker is the only writer of `cells`.
                        // Its reads past either end were written by a
                        // neighbor in iteration `iter - 1`, which the waits
                        // below completed before this iteration began. A
                        // neighbor writes into `read` again only in
                        // iteration `iter + 1`, which it cannot start until
                        // this worker has arrived for `iter`.
                        unsafe { sweep_shared(read, write, cells.clone()) };
                        trace!(worker, iter, "chunk swept");
                        arrive_and_wait_neighbors(own, left, right);
                        parity = parity.flip();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join();
        }
    });

    Ok(ResultBuffer::after(iterations))
}

/// Publish one completed iteration on `own`, then block until the neighbors
/// that exist have completed the same number of iterations.
///
/// Returns the number of iterations `own` has now completed.
fn arrive_and_wait_neighbors(
    own: &PhaseCounter,
    left: Option<&PhaseCounter>,
    right: Option<&PhaseCounter>,
) -> usize {
    let completed = own.arrive();
    for neighbor in [left, right].into_iter().flatten() {
        neighbor.wait_for(completed);
    }
    completed
}

/// Role of the two buffers for one iteration, toggled per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parity {
    ReadCurr,
    ReadNext,
}

impl Parity {
    fn flip(self) -> Self {
        match self {
            Parity::ReadCurr => Parity::ReadNext,
            Parity::ReadNext => Parity::ReadCurr,
        }
    }
}

#[derive(Clone, Copy)]
struct Buffers<'a, T> {
    next: SharedSlice<'a, T>,
    curr: SharedSlice<'a, T>,
}

impl<'a, T: Copy> Buffers<'a, T> {
    fn new(next: &'a mut [T], curr: &'a mut [T]) -> Self {
        Self {
            next: SharedSlice::new(next),
            curr: SharedSlice::new(curr),
        }
    }

    /// `(read, write)` for the given parity.
    fn roles(self, parity: Parity) -> (SharedSlice<'a, T>, SharedSlice<'a, T>) {
        match parity {
            Parity::ReadCurr => (self.curr, self.next),
            Parity::ReadNext => (self.next, self.curr),
        }
    }
}

/// Interior cell range of every worker, in worker order.
fn interior_chunks(tasks: usize, n: usize) -> Result<Vec<Range<usize>>> {
    if tasks == 0 {
        return Err(KernelError::ZeroTasks);
    }
    Ok(chunk_ranges(tasks, n)?
        .map(|r| r.start + 1..r.end + 1)
        .collect())
}

fn check_buffers<T>(next: &[T], curr: &[T], n: usize) -> Result<()> {
    let required = n.saturating_add(2);
    for (buffer, len) in [("next", next.len()), ("curr", curr.len())] {
        if len < required {
            return Err(KernelError::BufferTooShort {
                buffer,
                len,
                required,
            });
        }
    }
    Ok(())
}

#[inline]
fn sweep<T: Float>(read: &[T], write: &mut [T], cells: Range<usize>) {
    let two = T::one() + T::one();
    for j in cells {
        write[j] = (read[j - 1] + read[j + 1]) / two;
    }
}

/// # Safety
/// `cells` and the cell on each side lie inside both buffers, no other thread
/// writes `read[cells.start - 1 ..= cells.end]` and no other thread accesses
/// `write[cells]` for the duration of the call.
#[inline]
unsafe fn sweep_shared<T: Float>(
    read: SharedSlice<'_, T>,
    write: SharedSlice<'_, T>,
    cells: Range<usize>,
) {
    let two = T::one() + T::one();
    for j in cells {
        write.write(j, (read.read(j - 1) + read.read(j + 1)) / two);
    }
}
