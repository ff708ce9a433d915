//! Contiguous chunking of an index range.
//!
//! Every chunk except possibly the trailing ones has `ceil(n_elements / n_chunks)`
//! elements; trailing chunks are truncated at `n_elements` and may be empty.

use std::iter::FusedIterator;
use std::ops::Range;

use crate::{KernelError, Result};

/// Number of elements in every non-truncated chunk: `ceil(n_elements / n_chunks)`.
pub fn chunk_size(n_chunks: usize, n_elements: usize) -> Result<usize> {
    if n_chunks == 0 {
        return Err(KernelError::ZeroChunks);
    }
    Ok(n_elements.div_ceil(n_chunks))
}

/// Half-open index range `[start, end)` owned by `chunk`.
///
/// Empty trailing chunks are reported as `n_elements..n_elements`.
///
/// # Examples
///
/// ```rust
/// use phaser_kernels::partition_chunk;
///
/// assert_eq!(partition_chunk(0, 3, 10).unwrap(), 0..4);
/// assert_eq!(partition_chunk(2, 3, 10).unwrap(), 8..10);
/// assert_eq!(partition_chunk(3, 4, 2).unwrap(), 2..2);
/// ```
pub fn partition_chunk(chunk: usize, n_chunks: usize, n_elements: usize) -> Result<Range<usize>> {
    let size = chunk_size(n_chunks, n_elements)?;
    if chunk >= n_chunks {
        return Err(KernelError::ChunkOutOfRange { chunk, n_chunks });
    }
    Ok(range_for(chunk, size, n_elements))
}

/// All `n_chunks` ranges over `0..n_elements`, in ascending chunk order.
pub fn chunk_ranges(n_chunks: usize, n_elements: usize) -> Result<ChunkRanges> {
    let size = chunk_size(n_chunks, n_elements)?;
    Ok(ChunkRanges {
        next: 0,
        n_chunks,
        size,
        n_elements,
    })
}

#[inline]
fn range_for(chunk: usize, size: usize, n_elements: usize) -> Range<usize> {
    // Saturate so huge chunk indices over tiny inputs cannot overflow.
    let start = chunk.saturating_mul(size).min(n_elements);
    let end = chunk.saturating_add(1).saturating_mul(size).min(n_elements);
    start..end
}

/// Iterator returned by [`chunk_ranges`].
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    next: usize,
    n_chunks: usize,
    size: usize,
    n_elements: usize,
}

impl ChunkRanges {
    /// Common chunk size for this partition.
    pub fn chunk_size(&self) -> usize {
        self.size
    }
}

impl Iterator for ChunkRanges {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.n_chunks {
            return None;
        }
        let range = range_for(self.next, self.size, self.n_elements);
        self.next += 1;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_chunks - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkRanges {}

impl FusedIterator for ChunkRanges {}
