//! [`Axis`]: a typed view over one dimension's [`Index`] — the
//! dimension-agnostic half of a dimension's operation catalog. The
//! remaining, data-dependent half (selecting/slicing columns by value)
//! lives on [`crate::frame::Frame`].

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::Result;
use crate::index::Index;

/// Which dimension of a [`crate::frame::Frame`] an [`Axis`] views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The row dimension.
    Rows,
    /// The column dimension.
    Cols,
}

/// A typed view over one dimension's [`Index`].
#[derive(Debug, Clone)]
pub struct Axis<K: Eq + Hash + Clone + std::fmt::Debug> {
    index: Index<K>,
    direction: Direction,
    parallel: bool,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Axis<K> {
    /// Wraps `index` as an axis facing `direction`, sequential by default.
    pub fn new(index: Index<K>, direction: Direction) -> Self {
        Self {
            index,
            direction,
            parallel: false,
        }
    }

    /// Which dimension this axis views.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether iteration/reduction over this axis opts into the parallel
    /// façade.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Flips the parallel opt-in flag.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// The underlying index.
    pub fn index(&self) -> &Index<K> {
        &self.index
    }

    /// Mutable access to the underlying index.
    pub fn index_mut(&mut self) -> &mut Index<K> {
        &mut self.index
    }

    /// Live key count.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    /// Live keys, in ordinal order.
    pub fn keys(&self) -> Vec<K> {
        self.index.keys()
    }

    /// Live ordinals, `0..count()`.
    pub fn ordinals(&self) -> std::ops::Range<usize> {
        0..self.count()
    }

    /// Whether `key` is live on this axis.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// A shallow filtered axis over exactly `keys`, sharing storage with
    /// `self`.
    pub fn filter(&self, keys: impl IntoIterator<Item = K>) -> Result<Self> {
        Ok(Self {
            index: self.index.filter_keys(keys)?,
            direction: self.direction,
            parallel: self.parallel,
        })
    }

    /// A shallow filtered axis over the keys matching `predicate`.
    pub fn filter_predicate(&self, predicate: impl Fn(&K) -> bool) -> Self {
        Self {
            index: self.index.filter_predicate(predicate),
            direction: self.direction,
            parallel: self.parallel,
        }
    }

    /// Alias for [`Axis::filter`], for callers that read a row/column
    /// selection as "selecting" rather than "filtering".
    pub fn select(&self, keys: impl IntoIterator<Item = K>) -> Result<Self> {
        self.filter(keys)
    }

    /// Reorders this axis's ordinals by key comparator; canonical indices
    /// are untouched.
    pub fn sort_by(&mut self, cmp: impl Fn(&K, &K) -> std::cmp::Ordering) -> Result<()> {
        self.index.sort_by(cmp)
    }

    /// Reorders ascending or descending by key. Stable.
    pub fn sort(&mut self, ascending: bool) -> Result<()>
    where
        K: Ord,
    {
        self.index.sort(ascending)
    }

    /// Maps every key through `fn(oldKey, ordinal, canonical)`, preserving
    /// the canonical assignment.
    pub fn map_keys<K2: Eq + Hash + Clone + std::fmt::Debug>(&self, mapper: impl Fn(&K, usize, usize) -> K2) -> Result<Axis<K2>> {
        Ok(Axis {
            index: self.index.map(mapper)?,
            direction: self.direction,
            parallel: self.parallel,
        })
    }

    /// Rebinds `existing`'s canonical index to `replacement`, keeping its
    /// ordinal position fixed.
    pub fn replace_key(&mut self, existing: &K, replacement: K) -> Result<()> {
        self.index.replace(existing, replacement)
    }

    /// The first live key, in ordinal order.
    pub fn first_key(&self) -> Option<K> {
        self.index.get_key(0).ok()
    }

    /// The last live key, in ordinal order.
    pub fn last_key(&self) -> Option<K> {
        let count = self.count();
        count.checked_sub(1).and_then(|last| self.index.get_key(last).ok())
    }

    /// Groups live ordinals by `key_fn(key)`, preserving within-group
    /// ordinal order.
    pub fn group_by<G: Eq + Hash>(&self, key_fn: impl Fn(&K) -> G) -> HashMap<G, Vec<usize>> {
        let mut groups: HashMap<G, Vec<usize>> = HashMap::new();
        for ordinal in self.ordinals() {
            let key = self.index.get_key(ordinal).expect("ordinal in range");
            groups.entry(key_fn(&key)).or_default().push(ordinal);
        }
        groups
    }

    /// Unions `other`'s keys into this axis, honoring an explicit
    /// `ignore_duplicates` flag.
    pub fn add_all(&mut self, other: &Axis<K>, ignore_duplicates: bool) -> Result<usize> {
        self.index.add_all(other.keys(), ignore_duplicates)
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug + Ord> Axis<K> {
    /// The greatest live key strictly less than `key`; requires this axis
    /// to be in ascending order.
    pub fn lower_key(&self, key: &K) -> Option<K> {
        self.index.previous_key(key)
    }

    /// The least live key strictly greater than `key`; requires this axis
    /// to be in ascending order.
    pub fn higher_key(&self, key: &K) -> Option<K> {
        self.index.next_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_narrows_without_disturbing_source() {
        let axis = Axis::new(Index::from_keys(["a", "b", "c"]).unwrap(), Direction::Rows);
        let filtered = axis.filter(["a", "c"]).unwrap();
        assert_eq!(filtered.keys(), vec!["a", "c"]);
        assert_eq!(axis.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn group_by_partitions_ordinals() {
        let axis = Axis::new(Index::from_keys([1, 2, 3, 4, 5, 6]).unwrap(), Direction::Rows);
        let groups = axis.group_by(|k| k % 2 == 0);
        assert_eq!(groups[&true], vec![1, 3, 5]);
        assert_eq!(groups[&false], vec![0, 2, 4]);
    }

    #[test]
    fn first_last_key() {
        let axis = Axis::new(Index::from_keys(["x", "y", "z"]).unwrap(), Direction::Cols);
        assert_eq!(axis.first_key(), Some("x"));
        assert_eq!(axis.last_key(), Some("z"));
    }
}
