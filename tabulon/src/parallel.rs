//! The parallel execution façade: split-threshold-gated
//! fan-out over rayon's global pool, with a deterministic associative
//! reduction so a parallel run always agrees with its sequential
//! counterpart.

use rayon::prelude::*;

use crate::array::Stats;
use crate::config::Config;

/// Resolves the effective split threshold for a dimension of `count` items.
///
/// `override_threshold` is [`crate::config::Config::row_split_threshold`] or
/// `col_split_threshold`; when unset, the default is `max(1, count /
/// available_parallelism)`, so the item count alone never forces more
/// sub-tasks than there are worker threads to run them on.
pub fn split_threshold(count: usize, override_threshold: Option<usize>) -> usize {
    override_threshold.unwrap_or_else(|| {
        let workers = rayon::current_num_threads().max(1);
        (count / workers).max(1)
    })
}

/// Whether a dimension of `count` items, under `override_threshold`, is
/// large enough to be worth splitting across the pool at all.
pub fn should_parallelize(count: usize, override_threshold: Option<usize>) -> bool {
    count > split_threshold(count, override_threshold)
}

/// Partitions `0..count` into contiguous chunks of size `threshold` (the
/// last chunk may be shorter).
fn chunk_ranges(count: usize, threshold: usize) -> Vec<std::ops::Range<usize>> {
    let threshold = threshold.max(1);
    let mut ranges = Vec::with_capacity((count + threshold - 1) / threshold.max(1));
    let mut start = 0;
    while start < count {
        let end = (start + threshold).min(count);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Maps `0..count` through `f(index)` and reduces the results with
/// `combine`, splitting work across rayon's pool once `count` exceeds
/// `threshold`. Falls back to a single sequential chunk otherwise, so the
/// reduction order -- and thus the result, for an associative `combine` --
/// never depends on how many threads happen to be available.
pub fn map_reduce<T: Send>(
    count: usize,
    threshold: usize,
    identity: impl Fn() -> T + Sync,
    f: impl Fn(usize) -> T + Sync,
    combine: impl Fn(T, T) -> T + Sync,
) -> T {
    let chunks = if count > threshold { chunk_ranges(count, threshold) } else { vec![0..count] };
    chunks
        .into_par_iter()
        .map(|range| {
            let mut acc = identity();
            for i in range {
                acc = combine(acc, f(i));
            }
            acc
        })
        .reduce(&identity, &combine)
}

/// Streaming statistics over `values`, computed in parallel once `values`
/// exceeds the effective row-split threshold, using Chan's parallel-combine
/// rule on top of each chunk's Welford accumulator so the result matches a
/// sequential run within floating-point rounding.
pub fn parallel_stats(values: &[f64]) -> Stats {
    let threshold = split_threshold(values.len(), Config::current().row_split_threshold);
    if values.len() <= threshold {
        return Stats::new(values.iter().copied());
    }
    values
        .par_chunks(threshold)
        .map(|chunk| Stats::new(chunk.iter().copied()))
        .reduce(Stats::empty, Stats::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_threshold_defaults_from_worker_count() {
        let workers = rayon::current_num_threads().max(1);
        assert_eq!(split_threshold(workers * 10, None), (workers * 10 / workers).max(1));
    }

    #[test]
    fn split_threshold_honors_explicit_override() {
        assert_eq!(split_threshold(1_000, Some(17)), 17);
    }

    #[test]
    fn map_reduce_sums_match_sequential_sum() {
        let count = 10_000;
        let sequential: u64 = (0..count as u64).sum();
        let parallel = map_reduce(count, 37, || 0u64, |i| i as u64, |a, b| a + b);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn parallel_stats_matches_sequential_within_tolerance() {
        let values: Vec<f64> = (0..50_000).map(|i| (i as f64).sin() * 1000.0).collect();
        let sequential = Stats::new(values.iter().copied());
        let parallel = parallel_stats(&values);
        assert!((sequential.mean() - parallel.mean()).abs() < 1e-10);
        assert!((sequential.variance() - parallel.variance()).abs() < 1e-6);
    }
}
