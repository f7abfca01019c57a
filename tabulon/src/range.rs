//! [`Range`]: a lazy, optionally filtered and/or mapped sequence generator,
//! polymorphic over ordered primitive and temporal types.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rayon::prelude::*;

use crate::array::{ArrayElement, TypedArray};

/// A `Range`'s optional filter predicate, boxed so a filtered range stays
/// `Clone` (cheap `Arc` bump) without requiring `T: Clone` bounds to reach
/// through a closure.
type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// An ordered type a [`Range`] can step across.
///
/// `step` is always expressed as an `i64` magnitude; what unit it counts
/// (elements, days, seconds...) is up to the implementing type. A type
/// implements this by saying how many `step`-sized hops separate two values
/// ([`RangeElement::span_steps`]) and how to take `count` such hops from a
/// starting value ([`RangeElement::advance`]).
pub trait RangeElement: Copy + PartialEq + PartialOrd + Send + Sync + 'static {
    /// Number of `step`-sized hops from `self` to `end` (exclusive),
    /// rounded up so that `self.advance(step, span_steps)` reaches or just
    /// passes `end`. `step`'s sign is assumed to already match the
    /// direction from `self` to `end` (see [`Range::normalized_step`]).
    fn span_steps(self, end: Self, step: i64) -> i64;

    /// Advances `self` by `count` hops of size `step`.
    fn advance(self, step: i64, count: i64) -> Self;
}

/// Ceiling division of two values known to share a sign (or be zero),
/// shared by every integral [`RangeElement`] impl.
fn ceil_steps(diff: i64, step: i64) -> i64 {
    if diff == 0 {
        return 0;
    }
    let a = diff.unsigned_abs();
    let b = step.unsigned_abs().max(1);
    ((a + b - 1) / b) as i64
}

impl RangeElement for i32 {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        ceil_steps(i64::from(end) - i64::from(self), step)
    }
    fn advance(self, step: i64, count: i64) -> Self {
        (i64::from(self) + step * count) as i32
    }
}

impl RangeElement for i64 {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        ceil_steps(end - self, step)
    }
    fn advance(self, step: i64, count: i64) -> Self {
        self + step * count
    }
}

impl RangeElement for f64 {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        let diff = end - self;
        (diff / step as f64).ceil() as i64
    }
    fn advance(self, step: i64, count: i64) -> Self {
        self + step as f64 * count as f64
    }
}

impl RangeElement for NaiveDate {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        ceil_steps((end - self).num_days(), step)
    }
    fn advance(self, step: i64, count: i64) -> Self {
        self + Duration::days(step * count)
    }
}

impl RangeElement for NaiveDateTime {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        ceil_steps((end - self).num_seconds(), step)
    }
    fn advance(self, step: i64, count: i64) -> Self {
        self + Duration::seconds(step * count)
    }
}

impl RangeElement for NaiveTime {
    fn span_steps(self, end: Self, step: i64) -> i64 {
        let nanos_from_midnight = |t: Self| i64::from(t.num_seconds_from_midnight()) * 1_000_000_000 + i64::from(t.nanosecond());
        ceil_steps((nanos_from_midnight(end) - nanos_from_midnight(self)) / 1_000_000_000, step)
    }
    fn advance(self, step: i64, count: i64) -> Self {
        self + Duration::seconds(step * count)
    }
}

/// "Restartable" means [`Range::iter`] can be called any number of times,
/// each producing a fresh iterator from `start`.
#[derive(Clone)]
pub struct Range<T: RangeElement> {
    start: T,
    end: T,
    step: i64,
    predicate: Option<Predicate<T>>,
}

impl<T: RangeElement + std::fmt::Debug> std::fmt::Debug for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Range")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("step", &self.step)
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}

impl<T: RangeElement> Range<T> {
    /// Normalizes `step`'s sign from the direction of travel: positive when
    /// `end >= start`, negative otherwise. `step`'s magnitude is preserved;
    /// a magnitude of `0` is coerced to `1` to guarantee termination.
    fn normalized_step(start: T, end: T, step: i64) -> i64 {
        let magnitude = step.unsigned_abs().max(1) as i64;
        if end >= start {
            magnitude
        } else {
            -magnitude
        }
    }

    /// Constructs a range. `start == end` produces an empty range
    /// regardless of `step`.
    pub fn of(start: T, end: T, step: i64) -> Self {
        Self {
            start,
            end,
            step: Self::normalized_step(start, end, step),
            predicate: None,
        }
    }

    /// Constructs a filtered range: materialization only yields elements for
    /// which `predicate` returns `true`.
    pub fn filtered(
        start: T,
        end: T,
        step: i64,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            start,
            end,
            step: Self::normalized_step(start, end, step),
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// The range's start endpoint.
    pub fn start(&self) -> T {
        self.start
    }

    /// The range's end endpoint (exclusive).
    pub fn end(&self) -> T {
        self.end
    }

    /// The normalized step (sign carries direction).
    pub fn step(&self) -> i64 {
        self.step
    }

    /// Whether the range produces zero elements.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of raw positions between `start` and `end` (ignores any
    /// predicate, which can only shrink the materialized count further).
    pub fn raw_len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.start.span_steps(self.end, self.step).max(0) as usize
        }
    }

    /// A fresh iterator over this range's elements, re-evaluable any number
    /// of times.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let raw_len = self.raw_len();
        let predicate = self.predicate.clone();
        (0..raw_len)
            .map(move |i| self.start.advance(self.step, i as i64))
            .filter(move |value| match &predicate {
                Some(p) => p(value),
                None => true,
            })
    }

    /// Materializes into a dense [`TypedArray`], sequentially.
    pub fn to_array(&self) -> TypedArray<T>
    where
        T: ArrayElement,
    {
        TypedArray::of(self.iter().collect())
    }

    /// Materializes into a dense [`TypedArray`], splitting the work across
    /// the global rayon pool.
    pub fn to_array_parallel(&self) -> TypedArray<T>
    where
        T: ArrayElement,
    {
        let workers = rayon::current_num_threads().max(1);
        let parts = self.split(workers.max(1));
        let chunks: Vec<Vec<T>> = parts.par_iter().map(|part| part.iter().collect()).collect();
        TypedArray::of(chunks.into_iter().flatten().collect())
    }

    /// Maps every element through `f`, lazily -- the returned
    /// [`MappedRange`] re-applies `f` on each materialization.
    pub fn map<U>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> MappedRange<T, U> {
        MappedRange {
            source: self.clone(),
            f: Arc::new(f),
        }
    }

    /// Partitions the range into up to `target` contiguous sub-ranges whose
    /// endpoints abut: `parts[i].end == parts[i + 1].start`, and
    /// `parts[0].start == self.start`, `parts.last().end == self.end`.
    pub fn split(&self, target: usize) -> Vec<Range<T>> {
        let raw_len = self.raw_len();
        if raw_len == 0 || target <= 1 {
            return vec![self.clone()];
        }
        let target = target.min(raw_len.max(1));
        let chunk = (raw_len + target - 1) / target;
        let mut parts = Vec::with_capacity(target);
        let mut pos = 0usize;
        while pos < raw_len {
            let next = (pos + chunk).min(raw_len);
            parts.push(Range {
                start: self.start.advance(self.step, pos as i64),
                end: self.start.advance(self.step, next as i64),
                step: self.step,
                predicate: self.predicate.clone(),
            });
            pos = next;
        }
        parts
    }
}

/// A [`Range`] with a lazy element transform applied on materialization.
pub struct MappedRange<T: RangeElement, U> {
    source: Range<T>,
    f: Arc<dyn Fn(T) -> U + Send + Sync>,
}

impl<T: RangeElement, U> Clone for MappedRange<T, U> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: self.f.clone(),
        }
    }
}

impl<T: RangeElement, U> std::fmt::Debug for MappedRange<T, U>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRange").field("source", &self.source).finish()
    }
}

impl<T: RangeElement, U: Send> MappedRange<T, U> {
    /// A fresh iterator re-applying the map function to every source
    /// element.
    pub fn iter(&self) -> impl Iterator<Item = U> + '_ {
        self.source.iter().map(move |value| (self.f)(value))
    }

    /// Materializes into a dense `TypedArray<U>`, sequentially.
    pub fn to_array(&self) -> TypedArray<U>
    where
        U: ArrayElement,
    {
        TypedArray::of(self.iter().collect())
    }

    /// Splits the underlying source range into up to `target` sub-ranges,
    /// each still carrying the same map function.
    pub fn split(&self, target: usize) -> Vec<MappedRange<T, U>> {
        self.source
            .split(target)
            .into_iter()
            .map(|part| MappedRange {
                source: part,
                f: self.f.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_start_equals_end() {
        let range = Range::of(5_i64, 5, 1);
        assert!(range.is_empty());
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn materializes_expected_sequence() {
        let range = Range::of(0_i64, 5, 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn step_sign_follows_direction() {
        let range = Range::of(5_i64, 0, 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn filtered_range_skips_non_matching_elements() {
        let range = Range::filtered(0_i64, 10, 1, |v| v % 2 == 0);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn split_segments_abut_and_cover_the_range() {
        let range = Range::of(0_i64, 10_000_000, 1);
        let parts = range.split(8);
        assert_eq!(parts[0].start(), range.start());
        assert_eq!(parts.last().unwrap().end(), range.end());
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
    }

    #[test]
    fn split_materialization_matches_whole_materialization() {
        let range = Range::of(0_i64, 1_000, 1);
        let parts = range.split(7);
        let mut stitched = Vec::new();
        for part in &parts {
            stitched.extend(part.iter());
        }
        assert_eq!(stitched, range.iter().collect::<Vec<_>>());
    }

    #[test]
    fn map_applies_lazily_on_materialization() {
        let range = Range::of(0_i64, 5, 1);
        let mapped = range.map(|v| v * 10);
        assert_eq!(mapped.iter().collect::<Vec<_>>(), vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn to_array_parallel_matches_sequential() {
        let range = Range::of(0_i64, 10_000, 1);
        let sequential = range.to_array();
        let parallel = range.to_array_parallel();
        for i in 0..sequential.length() {
            assert_eq!(sequential.get(i).unwrap(), parallel.get(i).unwrap());
        }
    }
}
