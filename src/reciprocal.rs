//! Sum of reciprocals, sequentially and by fork-join.
//!
//! Every variant accumulates each range in ascending index order. The
//! parallel variants differ from [`sum_reciprocals_sequential`] only in how
//! partial sums are grouped, so they agree with it up to floating-point
//! reassociation rather than bit for bit.
//!
//! Zero elements are not special-cased: `1 / 0` yields `±inf` and
//! `inf + -inf` yields `NaN`, exactly as in the sequential loop.

use num_traits::Float;
use tracing::{instrument, trace};

use crate::partition::chunk_ranges;
use crate::threading::{fork, join};
use crate::{KernelError, Result};

#[inline]
fn sum_range<T: Float>(input: &[T]) -> T {
    input.iter().fold(T::zero(), |acc, &x| acc + x.recip())
}

/// Reference implementation: `Σ 1 / input[i]` in ascending index order.
///
/// Empty input sums to zero.
pub fn sum_reciprocals_sequential<T: Float>(input: &[T]) -> T {
    sum_range(input)
}

/// Fork-join with a single split.
///
/// The first half is forked as a task while the calling thread sums the
/// second half; the result is `left + right` once the task is joined.
///
/// Odd lengths are rejected with [`KernelError::OddLength`].
#[instrument(level = "debug", skip(input), fields(len = input.len()))]
pub fn sum_reciprocals_two_way<T>(input: &[T]) -> Result<T>
where
    T: Float + Send + Sync,
{
    if input.len() % 2 != 0 {
        return Err(KernelError::OddLength { len: input.len() });
    }
    let (left, right) = input.split_at(input.len() / 2);

    Ok(std::thread::scope(|s| {
        let left_task = fork(s, || sum_range(left));
        let right_sum = sum_range(right);
        left_task.join() + right_sum
    }))
}

/// Flat fork-join over `num_tasks` chunks.
///
/// One task is forked per chunk (see [`crate::chunk_ranges`]); every task is
/// joined and the partial sums are added in ascending chunk order, so the
/// result is reproducible for a given `(input, num_tasks)`.
#[instrument(level = "debug", skip(input), fields(len = input.len()))]
pub fn sum_reciprocals_n_way<T>(input: &[T], num_tasks: usize) -> Result<T>
where
    T: Float + Send + Sync,
{
    if num_tasks == 0 {
        return Err(KernelError::ZeroTasks);
    }
    let ranges = chunk_ranges(num_tasks, input.len())?;

    let partials: Vec<T> = std::thread::scope(|s| {
        let tasks: Vec<_> = ranges
            .map(|range| {
                let chunk = &input[range];
                fork(s, move || sum_range(chunk))
            })
            .collect();
        tasks.into_iter().map(|task| task.join()).collect()
    });
    trace!(tasks = partials.len(), "joined partial sums");

    Ok(partials.into_iter().fold(T::zero(), |acc, partial| acc + partial))
}

/// Recursive fork-join: halve the range until it is at most `grain` elements.
///
/// With the `parallel` feature the halves are scheduled on rayon's pool;
/// otherwise they run one after the other on the calling thread. The split
/// points depend only on `input.len()` and `grain`, so the result does not
/// depend on the number of threads.
#[instrument(level = "debug", skip(input), fields(len = input.len()))]
pub fn sum_reciprocals_recursive<T>(input: &[T], grain: usize) -> Result<T>
where
    T: Float + Send + Sync,
{
    if grain == 0 {
        return Err(KernelError::ZeroGrain);
    }
    Ok(sum_split(input, grain))
}

fn sum_split<T>(input: &[T], grain: usize) -> T
where
    T: Float + Send + Sync,
{
    if input.len() <= grain {
        return sum_range(input);
    }
    let (left, right) = input.split_at(input.len() / 2);
    let (l, r) = join(|| sum_split(left, grain), || sum_split(right, grain));
    l + r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(len: usize) -> Vec<f64> {
        (1..=len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_sequential_small() {
        let s = sum_reciprocals_sequential(&[1.0, 2.0, 4.0]);
        assert_eq!(s, 1.75);
    }

    #[test]
    fn test_empty_is_zero() {
        let empty: [f64; 0] = [];
        assert_eq!(sum_reciprocals_sequential(&empty), 0.0);
        assert_eq!(sum_reciprocals_two_way(&empty).unwrap(), 0.0);
        assert_eq!(sum_reciprocals_n_way(&empty, 3).unwrap(), 0.0);
        assert_eq!(sum_reciprocals_recursive(&empty, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_two_way_rejects_odd_length() {
        assert_eq!(
            sum_reciprocals_two_way(&[1.0, 2.0, 3.0]),
            Err(KernelError::OddLength { len: 3 })
        );
    }

    #[test]
    fn test_two_way_matches_sequential() {
        let input = ramp(1000);
        let expected = sum_reciprocals_sequential(&input);
        assert_relative_eq!(
            sum_reciprocals_two_way(&input).unwrap(),
            expected,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_n_way_zero_tasks() {
        assert_eq!(
            sum_reciprocals_n_way(&[1.0f64], 0),
            Err(KernelError::ZeroTasks)
        );
    }

    #[test]
    fn test_n_way_more_tasks_than_elements() {
        let input = [1.0, 2.0, 4.0];
        assert_eq!(sum_reciprocals_n_way(&input, 8).unwrap(), 1.75);
    }

    #[test]
    fn test_n_way_one_task_is_bit_exact() {
        let input = ramp(777);
        assert_eq!(
            sum_reciprocals_n_way(&input, 1).unwrap(),
            sum_reciprocals_sequential(&input)
        );
    }

    #[test]
    fn test_n_way_is_reproducible() {
        let input = ramp(10_001);
        let first = sum_reciprocals_n_way(&input, 7).unwrap();
        for _ in 0..5 {
            assert_eq!(sum_reciprocals_n_way(&input, 7).unwrap(), first);
        }
    }

    #[test]
    fn test_recursive_matches_sequential() {
        let input = ramp(5000);
        let expected = sum_reciprocals_sequential(&input);
        for grain in [1, 3, 64, 5000, 10_000] {
            assert_relative_eq!(
                sum_reciprocals_recursive(&input, grain).unwrap(),
                expected,
                max_relative = 1e-9
            );
        }
        assert_eq!(
            sum_reciprocals_recursive(&input, 0),
            Err(KernelError::ZeroGrain)
        );
    }

    #[test]
    fn test_zero_element_gives_infinity() {
        let input = [1.0, 0.0, 2.0, 4.0];
        assert_eq!(sum_reciprocals_sequential(&input), f64::INFINITY);
        assert_eq!(sum_reciprocals_two_way(&input).unwrap(), f64::INFINITY);
        assert_eq!(sum_reciprocals_n_way(&input, 2).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_opposite_zeros_give_nan() {
        let input = [0.0, 1.0, -0.0, 1.0];
        assert!(sum_reciprocals_sequential(&input).is_nan());
        assert!(sum_reciprocals_two_way(&input).unwrap().is_nan());
        assert!(sum_reciprocals_n_way(&input, 4).unwrap().is_nan());
    }

    #[test]
    fn test_f32_elements() {
        let input: Vec<f32> = vec![1.0, 2.0, 4.0, 8.0];
        assert_relative_eq!(sum_reciprocals_n_way(&input, 2).unwrap(), 1.875f32);
    }
}
