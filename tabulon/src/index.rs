//! [`Index`]: a key ↔ canonical-index bijection plus an independent,
//! mutable ordinal permutation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::config::{Config, DuplicatePolicy};
use crate::error::{Error, Result};

/// The shared, append-only bijection between keys and canonical indices.
///
/// Wrapped in `Arc` and mutated through `Arc::make_mut`, which gives a
/// filter-Index a copy-on-write snapshot for free: as long as a filter
/// holds a clone of this `Arc`, `Arc::make_mut` on the parent's side clones
/// the table before mutating it, so the filter keeps seeing the table as
/// of its own construction.
///
/// `add`/`replace` are permanent: a key's canonical index never changes
/// for the life of the table it belongs to. `ord_to_canonical` is this
/// particular view's mutable ordering over the live canonical indices --
/// `sort`/`filter` only ever touch it, never the table.
#[derive(Debug, Clone)]
struct KeyTable<K: Eq + Hash + Clone + std::fmt::Debug> {
    key_to_canonical: HashMap<K, usize>,
    canonical_to_key: Vec<K>,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> KeyTable<K> {
    fn new() -> Self {
        Self {
            key_to_canonical: HashMap::new(),
            canonical_to_key: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Index<K: Eq + Hash + Clone + std::fmt::Debug> {
    table: Arc<KeyTable<K>>,
    ord_to_canonical: Vec<usize>,
    canonical_to_ordinal: HashMap<usize, usize>,
    read_only: bool,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Clone for Index<K> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            ord_to_canonical: self.ord_to_canonical.clone(),
            canonical_to_ordinal: self.canonical_to_ordinal.clone(),
            read_only: self.read_only,
        }
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Index<K> {
    /// An empty index.
    pub fn new() -> Self {
        Self {
            table: Arc::new(KeyTable::new()),
            ord_to_canonical: Vec::new(),
            canonical_to_ordinal: HashMap::new(),
            read_only: false,
        }
    }

    /// An index over `keys`, in the given order. Honors
    /// [`Config::current`]'s duplicate policy exactly like repeated
    /// [`Index::add`] calls.
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Result<Self> {
        let mut index = Self::new();
        for key in keys {
            index.add(key)?;
        }
        Ok(index)
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::read_only("index"))
        } else {
            Ok(())
        }
    }

    /// Inserts a brand-new key, assigning it the next canonical index, and
    /// appends it at the end of this view's ordinal order.
    fn push_new(&mut self, key: K) -> usize {
        let table = Arc::make_mut(&mut self.table);
        let canonical = table.canonical_to_key.len();
        table.canonical_to_key.push(key.clone());
        table.key_to_canonical.insert(key, canonical);
        let ordinal = self.ord_to_canonical.len();
        self.ord_to_canonical.push(canonical);
        self.canonical_to_ordinal.insert(canonical, ordinal);
        canonical
    }

    fn rebuild_ordinal_lookup(&mut self) {
        self.canonical_to_ordinal = self.ord_to_canonical.iter().enumerate().map(|(ord, &canonical)| (canonical, ord)).collect();
    }

    /// Live key count in this view.
    pub fn len(&self) -> usize {
        self.ord_to_canonical.len()
    }

    /// Whether this view has no live keys.
    pub fn is_empty(&self) -> bool {
        self.ord_to_canonical.is_empty()
    }

    /// Live keys, in ordinal order.
    pub fn keys(&self) -> Vec<K> {
        self.ord_to_canonical.iter().map(|&canonical| self.table.canonical_to_key[canonical].clone()).collect()
    }

    /// Whether `key` is live in this view (present in the shared table and
    /// not filtered out of this view's ordinal order).
    pub fn contains(&self, key: &K) -> bool {
        self.table
            .key_to_canonical
            .get(key)
            .is_some_and(|canonical| self.canonical_to_ordinal.contains_key(canonical))
    }

    /// The key at ordinal position `ordinal`.
    pub fn get_key(&self, ordinal: usize) -> Result<K> {
        self.ord_to_canonical
            .get(ordinal)
            .map(|&canonical| self.table.canonical_to_key[canonical].clone())
            .ok_or_else(|| Error::out_of_bounds(ordinal, self.len()))
    }

    /// The canonical index for `key`, if it is live in this view.
    pub fn get_index_for_key(&self, key: &K) -> Result<usize> {
        let canonical = self.table.key_to_canonical.get(key).copied().ok_or_else(|| Error::key_not_found(key))?;
        if self.canonical_to_ordinal.contains_key(&canonical) {
            Ok(canonical)
        } else {
            Err(Error::key_not_found(key))
        }
    }

    /// The current ordinal position of `key` in this view.
    pub fn get_ordinal_for_key(&self, key: &K) -> Result<usize> {
        let canonical = self.table.key_to_canonical.get(key).copied().ok_or_else(|| Error::key_not_found(key))?;
        self.canonical_to_ordinal.get(&canonical).copied().ok_or_else(|| Error::key_not_found(key))
    }

    /// The canonical index backing ordinal position `ordinal`.
    pub fn canonical_at(&self, ordinal: usize) -> Result<usize> {
        self.ord_to_canonical.get(ordinal).copied().ok_or_else(|| Error::out_of_bounds(ordinal, self.len()))
    }

    /// Reorders this view's ordinals ascending or descending by key.
    /// Stable: keys comparing equal keep their relative order.
    pub fn sort(&mut self, ascending: bool) -> Result<()>
    where
        K: Ord,
    {
        self.sort_by(|a, b| if ascending { a.cmp(b) } else { b.cmp(a) })
    }

    /// Reorders this view's ordinals by `cmp`, leaving canonical indices
    /// untouched. Stable.
    pub fn sort_by(&mut self, cmp: impl Fn(&K, &K) -> std::cmp::Ordering) -> Result<()> {
        self.check_writable()?;
        let table = &self.table;
        self.ord_to_canonical
            .sort_by(|&a, &b| cmp(&table.canonical_to_key[a], &table.canonical_to_key[b]));
        self.rebuild_ordinal_lookup();
        Ok(())
    }

    /// Adds every key in `keys` not already present, honoring an explicit
    /// `ignore_duplicates` flag rather than the ambient duplicate policy.
    /// Returns the number of keys actually added.
    pub fn add_all(&mut self, keys: impl IntoIterator<Item = K>, ignore_duplicates: bool) -> Result<usize> {
        self.check_writable()?;
        let mut added = 0;
        for key in keys {
            if self.table.key_to_canonical.contains_key(&key) {
                if ignore_duplicates {
                    continue;
                }
                return Err(Error::duplicate_key(&key));
            }
            self.push_new(key);
            added += 1;
        }
        Ok(added)
    }

    /// Inserts `key`, re-inserting an existing key is a no-op that
    /// returns its existing canonical index; under
    /// [`DuplicatePolicy::Reject`] it fails with
    /// [`Error::DuplicateKey`].
    pub fn add(&mut self, key: K) -> Result<usize> {
        self.check_writable()?;
        if let Some(&canonical) = self.table.key_to_canonical.get(&key) {
            return match Config::current().duplicate_policy {
                DuplicatePolicy::Ignore => Ok(canonical),
                DuplicatePolicy::Reject => Err(Error::duplicate_key(&key)),
            };
        }
        Ok(self.push_new(key))
    }

    /// Inserts every key in `keys`, honoring an explicit `ignore_duplicates`
    /// flag.
    pub fn filter_keys(&self, keys: impl IntoIterator<Item = K>) -> Result<Self> {
        let mut ord_to_canonical = Vec::new();
        for key in keys {
            ord_to_canonical.push(self.get_index_for_key(&key)?);
        }
        let mut filtered = Self {
            table: self.table.clone(),
            ord_to_canonical,
            canonical_to_ordinal: HashMap::new(),
            read_only: false,
        };
        filtered.rebuild_ordinal_lookup();
        Ok(filtered)
    }

    /// A shallow filter-index over the keys (in this view's current order)
    /// matching `predicate`.
    pub fn filter_predicate(&self, predicate: impl Fn(&K) -> bool) -> Self {
        let mut ord_to_canonical = Vec::new();
        for &canonical in &self.ord_to_canonical {
            if predicate(&self.table.canonical_to_key[canonical]) {
                ord_to_canonical.push(canonical);
            }
        }
        let mut filtered = Self {
            table: self.table.clone(),
            ord_to_canonical,
            canonical_to_ordinal: HashMap::new(),
            read_only: false,
        };
        filtered.rebuild_ordinal_lookup();
        filtered
    }

    /// Atomically rebinds `existing`'s canonical index to `replacement`.
    /// `existing == replacement` is a no-op under
    /// [`DuplicatePolicy::Ignore`] and a [`Error::DuplicateKey`] under
    /// [`DuplicatePolicy::Reject`].
    pub fn replace(&mut self, existing: &K, replacement: K) -> Result<()> {
        self.check_writable()?;
        let canonical = self.get_index_for_key(existing)?;
        if *existing == replacement {
            return match Config::current().duplicate_policy {
                DuplicatePolicy::Ignore => Ok(()),
                DuplicatePolicy::Reject => Err(Error::duplicate_key(existing)),
            };
        }
        if self.table.key_to_canonical.contains_key(&replacement) {
            return Err(Error::duplicate_key(&replacement));
        }
        let table = Arc::make_mut(&mut self.table);
        table.key_to_canonical.remove(existing);
        table.key_to_canonical.insert(replacement.clone(), canonical);
        table.canonical_to_key[canonical] = replacement;
        Ok(())
    }

    /// Deep-clones this view into an independent table (no sharing with
    /// any parent/filter).
    pub fn copy(&self) -> Self {
        Self {
            table: Arc::new((*self.table).clone()),
            ord_to_canonical: self.ord_to_canonical.clone(),
            canonical_to_ordinal: self.canonical_to_ordinal.clone(),
            read_only: false,
        }
    }

    /// A shallow wrapper disallowing `add`/`replace`/in-place `sort`.
    pub fn read_only(&self) -> Self {
        let mut clone = self.clone();
        clone.read_only = true;
        clone
    }

    /// Returns a new `Index<K2>` with the same canonical/ordinal shape,
    /// mapping each key through `mapper(key, ordinal, canonical)`. Fails if
    /// two distinct source keys map to the same new key.
    pub fn map<K2: Eq + Hash + Clone + std::fmt::Debug>(&self, mapper: impl Fn(&K, usize, usize) -> K2) -> Result<Index<K2>> {
        let mut mapped = Index::new();
        for (ordinal, &canonical) in self.ord_to_canonical.iter().enumerate() {
            let old_key = &self.table.canonical_to_key[canonical];
            let new_key = mapper(old_key, ordinal, canonical);
            if mapped.table.key_to_canonical.contains_key(&new_key) {
                return Err(Error::duplicate_key(&new_key));
            }
            mapped.push_new(new_key);
        }
        Ok(mapped)
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug + Ord> Index<K> {
    /// The greatest live key strictly less than `key`. Requires this view
    /// to currently be in ascending order; undefined (not panicking, just
    /// meaningless) otherwise.
    pub fn previous_key(&self, key: &K) -> Option<K> {
        let keys = self.keys();
        let idx = crate::array::sort::lower_bound(&keys, key, &|a, b| a.cmp(b));
        (idx > 0).then(|| keys[idx - 1].clone())
    }

    /// The least live key strictly greater than `key`. Same ordering
    /// requirement as [`Index::previous_key`].
    pub fn next_key(&self, key: &K) -> Option<K> {
        let keys = self.keys();
        let idx = crate::array::sort::upper_bound(&keys, key, &|a, b| a.cmp(b));
        (idx < keys.len()).then(|| keys[idx].clone())
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Default for Index<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_and_key_round_trip() {
        let index = Index::from_keys(["a", "b", "c"]).unwrap();
        for key in ["a", "b", "c"] {
            let ord = index.get_ordinal_for_key(&key).unwrap();
            assert_eq!(index.get_key(ord).unwrap(), key);
        }
    }

    #[test]
    fn sort_preserves_canonical_indices() {
        let mut index = Index::from_keys(["a", "c", "b"]).unwrap();
        assert_eq!(index.get_index_for_key(&"b").unwrap(), 2);
        index.sort(true).unwrap();
        assert_eq!(index.keys(), vec!["a", "b", "c"]);
        assert_eq!(index.get_index_for_key(&"b").unwrap(), 2);
    }

    #[test]
    fn duplicate_add_under_reject_fails() {
        let mut index = Index::from_keys(["a"]).unwrap();
        let mut cfg = Config::default();
        cfg.duplicate_policy = DuplicatePolicy::Reject;
        cfg.with(|| {
            assert!(matches!(index.add("a"), Err(Error::DuplicateKey { .. })));
        });
    }

    #[test]
    fn duplicate_add_under_ignore_is_noop() {
        let mut index = Index::from_keys(["a"]).unwrap();
        let canonical_before = index.get_index_for_key(&"a").unwrap();
        let canonical_after = index.add("a").unwrap();
        assert_eq!(canonical_before, canonical_after);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn filter_shares_table_and_is_unaffected_by_later_parent_adds() {
        let mut parent = Index::from_keys(["a", "b", "c"]).unwrap();
        let filtered = parent.filter_keys(["a", "c"]).unwrap();
        assert_eq!(filtered.keys(), vec!["a", "c"]);
        parent.add("d").unwrap();
        // The filter's own ordinal view is unaffected by the parent's later add.
        assert_eq!(filtered.keys(), vec!["a", "c"]);
    }

    #[test]
    fn replace_rebinds_canonical_index() {
        let mut index = Index::from_keys(["a", "b"]).unwrap();
        let canonical = index.get_index_for_key(&"a").unwrap();
        index.replace(&"a", "z").unwrap();
        assert_eq!(index.get_index_for_key(&"z").unwrap(), canonical);
        assert!(index.get_index_for_key(&"a").is_err());
    }

    #[test]
    fn replace_self_is_noop_under_ignore() {
        let mut index = Index::from_keys(["a"]).unwrap();
        index.replace(&"a", "a").unwrap();
        assert_eq!(index.keys(), vec!["a"]);
    }

    #[test]
    fn read_only_rejects_add() {
        let index = Index::from_keys(["a"]).unwrap().read_only();
        let mut index = index;
        assert!(matches!(index.add("b"), Err(Error::ReadOnly { .. })));
    }

    #[test]
    fn previous_next_key_bracket_value() {
        let index = Index::from_keys(["a", "c", "e", "g", "i", "k", "m", "o", "q", "s", "u", "w", "y"]).unwrap();
        assert_eq!(index.previous_key(&"e"), Some("c"));
        assert_eq!(index.previous_key(&"f"), Some("e"));
        assert_eq!(index.next_key(&"i"), Some("k"));
        assert_eq!(index.next_key(&"z"), None);
    }

    #[test]
    fn copy_is_independent_of_source() {
        let index = Index::from_keys(["a", "b"]).unwrap();
        let mut copy = index.copy();
        copy.add("c").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(copy.len(), 3);
    }
}
