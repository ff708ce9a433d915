//! Fork-join reductions and phased stencil kernels.
//!
//! This crate provides two small parallel numeric kernels, each offered in a
//! sequential form (the reference) and one or more parallel forms that must
//! agree with it up to floating-point reassociation.
//!
//! # Partitioning
//!
//! - [`chunk_size`], [`partition_chunk`], [`chunk_ranges`]: contiguous
//!   ceiling-division chunks over `0..n_elements`
//!
//! # Reciprocal Sum
//!
//! - [`sum_reciprocals_sequential`]: ascending-index reference
//! - [`sum_reciprocals_two_way`]: a single fork-join split into two halves
//! - [`sum_reciprocals_n_way`]: one task per chunk, partials combined in chunk order
//! - [`sum_reciprocals_recursive`]: recursive halving down to a grain size
//!
//! # 1-D Averaging
//!
//! - [`run_averaging_sequential`]: reference Jacobi sweep
//! - [`run_averaging_global_barrier`]: all workers meet at a barrier every iteration
//! - [`run_averaging_fuzzy_barrier`]: each worker waits only on its two neighbors
//! - [`run_averaging`]: dispatch on an [`AveragingStrategy`]
//!
//! Averaging buffers hold `n` interior cells between two fixed boundary
//! cells (`0` and `n + 1`). The kernels ping-pong between the two buffers,
//! so the returned [`ResultBuffer`] says which one holds the final values.
//!
//! # Example
//!
//! ```rust
//! use phaser_kernels::{run_averaging_fuzzy_barrier, sum_reciprocals_n_way, ResultBuffer};
//!
//! let sum: f64 = sum_reciprocals_n_way(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
//! assert!((sum - 25.0 / 12.0).abs() < 1e-12);
//!
//! let mut next = vec![1.0, 0.0, 0.0, 0.0, 1.0];
//! let mut curr = next.clone();
//! let held = run_averaging_fuzzy_barrier(1, &mut next, &mut curr, 3, 3).unwrap();
//! assert_eq!(held, ResultBuffer::Next);
//! assert_eq!(next, vec![1.0, 0.5, 0.0, 0.5, 1.0]);
//! ```
//!
//! # Features
//!
//! - `parallel` (default): use rayon's work-stealing pool for
//!   [`sum_reciprocals_recursive`]. Without it the recursion runs on the
//!   calling thread. The other kernels always use scoped OS threads, since
//!   barrier waits must never share a worker thread.

mod averaging;
mod partition;
mod phase;
mod reciprocal;
mod threading;

// ============================================================================
// Partitioning
// ============================================================================
pub use partition::{chunk_ranges, chunk_size, partition_chunk, ChunkRanges};

// ============================================================================
// Reductions
// ============================================================================
pub use reciprocal::{
    sum_reciprocals_n_way, sum_reciprocals_recursive, sum_reciprocals_sequential,
    sum_reciprocals_two_way,
};

// ============================================================================
// Averaging
// ============================================================================
pub use averaging::{
    run_averaging, run_averaging_fuzzy_barrier, run_averaging_global_barrier,
    run_averaging_sequential, AveragingStrategy, ResultBuffer,
};

// ============================================================================
// Synchronization primitives
// ============================================================================
pub use phase::PhaseCounter;
pub use threading::{fork, Task};

// ============================================================================
// Constants
// ============================================================================

/// Default leaf size for [`sum_reciprocals_recursive`].
///
/// Ranges at or below this many elements are summed sequentially.
pub const DEFAULT_GRAIN: usize = 1 << 14;

// ============================================================================
// Error types
// ============================================================================

/// Broad classification of a [`KernelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A count or length argument is outside its valid domain.
    InvalidArgument,
    /// An index or buffer length does not cover the requested range.
    IndexOutOfRange,
}

/// Errors reported by the kernels.
///
/// Every error is detected before any worker is spawned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// A partition was requested with zero chunks.
    #[error("number of chunks must be positive")]
    ZeroChunks,

    /// A parallel kernel was asked to run with zero tasks.
    #[error("number of tasks must be positive")]
    ZeroTasks,

    /// Recursive reduction grain must be at least one element.
    #[error("grain size must be positive")]
    ZeroGrain,

    /// The two-way split needs an even number of elements.
    #[error("two-way split requires an even length, got {len}")]
    OddLength { len: usize },

    /// Chunk index is not below the number of chunks.
    #[error("chunk {chunk} out of range for {n_chunks} chunks")]
    ChunkOutOfRange { chunk: usize, n_chunks: usize },

    /// A caller buffer cannot hold `n` interior cells plus both boundaries.
    #[error("buffer `{buffer}` has length {len}, need at least {required}")]
    BufferTooShort {
        buffer: &'static str,
        len: usize,
        required: usize,
    },
}

impl KernelError {
    /// The category this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::ZeroChunks
            | KernelError::ZeroTasks
            | KernelError::ZeroGrain
            | KernelError::OddLength { .. } => ErrorKind::InvalidArgument,
            KernelError::ChunkOutOfRange { .. } | KernelError::BufferTooShort { .. } => {
                ErrorKind::IndexOutOfRange
            }
        }
    }
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
