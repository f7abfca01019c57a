//! [`TypedArray`]: a length-`N`, per-type specialized, polymorphic 1-D
//! container with three interchangeable storage backends.

pub mod backend;
pub mod element;
pub mod sort;
pub mod stats;

use std::any::Any;
use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub use backend::{Backend, BackendStyle, SparseStore};
pub use element::{ArrayElement, FixedWidth, PrimitiveAccess, ScalarConvert};
pub use stats::{NumericElement, Stats};

use crate::error::{Error, Result};
use crate::types::{Scalar, TypeCode};

/// A length-`N` sequence specialized for one `TypeCode`, backed by a dense
/// buffer, a sparse hash map, or a memory-mapped byte region.
#[derive(Debug)]
pub struct TypedArray<T: ArrayElement> {
    length: usize,
    load_factor: f64,
    default_value: T,
    backend: Backend<T>,
    read_only: bool,
}

impl<T: ArrayElement> TypedArray<T> {
    /// Creates a dense array of `length` slots, each holding
    /// `T::default_sentinel()`.
    pub fn dense(length: usize) -> Self {
        Self {
            length,
            load_factor: 1.0,
            default_value: T::default_sentinel(),
            backend: Backend::Dense(vec![T::default_sentinel(); length]),
            read_only: false,
        }
    }

    /// Creates a dense array from an explicit sequence of values.
    pub fn of(values: Vec<T>) -> Self {
        Self {
            length: values.len(),
            load_factor: 1.0,
            default_value: T::default_sentinel(),
            backend: Backend::Dense(values),
            read_only: false,
        }
    }

    /// Creates a single-element dense array.
    pub fn singleton(value: T) -> Self {
        Self::of(vec![value])
    }

    /// Creates a length-`0` dense array.
    pub fn empty() -> Self {
        Self::dense(0)
    }

    /// Creates a sparse array of `length` logical slots over `capacity`
    /// physical slots, auto-promoting to dense once occupancy exceeds
    /// `load_factor * capacity`.
    pub fn sparse(length: usize, capacity: usize, default_value: T, load_factor: f64) -> Self {
        Self {
            length,
            load_factor,
            default_value: default_value.clone(),
            backend: Backend::Sparse(SparseStore::new(capacity, default_value, load_factor)),
            read_only: false,
        }
    }

    /// The array's `TypeCode`.
    pub fn type_code(&self) -> TypeCode {
        T::TYPE_CODE
    }

    /// Current logical length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Backend's physical capacity (equals `length` for dense arrays).
    pub fn capacity(&self) -> usize {
        match &self.backend {
            Backend::Dense(data) => data.len(),
            Backend::Sparse(store) => store.capacity(),
            Backend::Mapped(store) => store.capacity(),
        }
    }

    /// Which backend currently stores the data.
    pub fn backend_style(&self) -> BackendStyle {
        self.backend.style()
    }

    /// Whether this array disallows mutation.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn check_bounds(&self, index: usize) -> Result<()> {
        if index >= self.length {
            Err(Error::out_of_bounds(index, self.length))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::read_only("array"))
        } else {
            Ok(())
        }
    }

    /// Grows the array to `new_length` slots, filling new slots with the
    /// default value. Fails on a read-only array.
    pub fn expand(&mut self, new_length: usize) -> Result<()> {
        self.check_writable()?;
        if new_length < self.length {
            return Ok(());
        }
        match &mut self.backend {
            Backend::Dense(data) => data.resize(new_length, self.default_value.clone()),
            Backend::Sparse(store) => store.set_capacity(new_length.max(store.capacity())),
            Backend::Mapped(_) => {
                return Err(Error::read_only(
                    "mapped array (capacity is fixed at creation)",
                ))
            }
        }
        self.length = new_length;
        Ok(())
    }

    /// Reads the value at `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.check_bounds(index)?;
        Ok(match &self.backend {
            Backend::Dense(data) => data[index].clone(),
            Backend::Sparse(store) => store.get(index),
            Backend::Mapped(store) => {
                self.get_mapped(store, index)
            }
        })
    }

    fn get_mapped(&self, _store: &backend::MappedStore<T>, index: usize) -> T {
        // Only reachable for `T: FixedWidth`; see the specialized
        // `impl<T: FixedWidth> TypedArray<T>` block below, which shadows
        // mapped-backend construction. A generic `TypedArray<T>` without
        // `FixedWidth` can never actually hold a `Backend::Mapped` value.
        let _ = index;
        unreachable!("Backend::Mapped is only constructed for T: FixedWidth")
    }

    /// Writes `value` at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.check_writable()?;
        self.check_bounds(index)?;
        let previous = match &mut self.backend {
            Backend::Dense(data) => std::mem::replace(&mut data[index], value),
            Backend::Sparse(store) => {
                let (previous, should_promote) = store.set(index, value);
                if should_promote {
                    let dense = store.to_dense(self.length);
                    debug!(length = self.length, "promoting sparse array to dense");
                    self.backend = Backend::Dense(dense);
                }
                previous
            }
            Backend::Mapped(_) => unreachable!("see get_mapped"),
        };
        Ok(previous)
    }

    /// Sets every slot in `range` to `value`.
    pub fn fill(&mut self, value: T, range: std::ops::Range<usize>) -> Result<()> {
        self.check_writable()?;
        if range.end > self.length {
            return Err(Error::out_of_bounds(range.end, self.length));
        }
        for i in range {
            self.set(i, value.clone())?;
        }
        Ok(())
    }

    /// Applies `f(index)` to every slot in `[0, length)`, writing the
    /// result back in place.
    pub fn apply(&mut self, mut f: impl FnMut(usize) -> T) -> Result<&mut Self> {
        self.check_writable()?;
        for i in 0..self.length {
            let value = f(i);
            self.set(i, value)?;
        }
        Ok(self)
    }

    /// Maps every slot through `f(index)` into a freshly allocated dense
    /// array of another element type.
    pub fn map_to<U: ArrayElement>(&self, mut f: impl FnMut(usize) -> U) -> TypedArray<U> {
        let values: Vec<U> = (0..self.length).map(&mut f).collect();
        TypedArray::of(values)
    }

    /// Deep-copies the whole array, preserving backend style.
    pub fn copy(&self) -> Self {
        self.copy_range(0..self.length)
    }

    /// Deep-copies `range` into a new dense array.
    pub fn copy_range(&self, range: std::ops::Range<usize>) -> Self {
        let values: Vec<T> = range.map(|i| self.get(i).expect("range within bounds")).collect();
        Self::of(values)
    }

    /// Deep-copies the slots at `indices` (in the given order) into a new
    /// dense array.
    pub fn copy_indices(&self, indices: &[usize]) -> Result<Self> {
        let mut values = Vec::with_capacity(indices.len());
        for &i in indices {
            values.push(self.get(i)?);
        }
        Ok(Self::of(values))
    }

    /// Returns a shallow, read-only wrapper: a copy of the current values
    /// with further mutation disallowed.
    pub fn read_only(&self) -> Self {
        let mut clone = self.copy();
        clone.read_only = true;
        clone
    }

    /// Sorts `range` ascending (or descending) using the dual-pivot
    /// quicksort for primitives (a stable sort for reference types).
    pub fn sort(&mut self, ascending: bool, range: std::ops::Range<usize>) -> Result<()> {
        self.sort_by(
            move |a, b| {
                let ord = T::total_order(a, b);
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            },
            range,
        )
    }

    /// Sorts `range` using a custom comparator.
    pub fn sort_by(
        &mut self,
        cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
        range: std::ops::Range<usize>,
    ) -> Result<()> {
        self.check_writable()?;
        if range.end > self.length {
            return Err(Error::out_of_bounds(range.end, self.length));
        }
        let mut slice: Vec<T> = (range.clone()).map(|i| self.get(i).expect("in range")).collect();
        if matches!(self.backend, Backend::Dense(_)) {
            sort::dual_pivot_quicksort(&mut slice, &cmp);
        } else {
            sort::stable_sort(&mut slice, &cmp);
        }
        for (offset, value) in slice.into_iter().enumerate() {
            self.set(range.start + offset, value)?;
        }
        Ok(())
    }

    /// Binary-searches `[from, to)` (must be ascending under `T::total_order`)
    /// for `value`. Returns the index, or `-(insertionPoint)-1` if absent.
    pub fn binary_search(&self, value: &T, range: std::ops::Range<usize>) -> Result<isize> {
        self.binary_search_by(value, T::total_order, range)
    }

    /// Binary search with a custom comparator.
    pub fn binary_search_by(
        &self,
        value: &T,
        cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
        range: std::ops::Range<usize>,
    ) -> Result<isize> {
        if range.end > self.length {
            return Err(Error::out_of_bounds(range.end, self.length));
        }
        let slice: Vec<T> = range.clone().map(|i| self.get(i).expect("in range")).collect();
        let local = sort::binary_search(&slice, value, &cmp);
        Ok(sort::encode_search_result(local.map(|i| i + range.start).map_err(|i| i + range.start)))
    }

    /// Greatest value strictly less than `value`, assuming ascending order.
    pub fn previous(&self, value: &T) -> Option<T> {
        let slice: Vec<T> = (0..self.length).map(|i| self.get(i).expect("in range")).collect();
        let lo = sort::lower_bound(&slice, value, &T::total_order);
        (lo > 0).then(|| slice[lo - 1].clone())
    }

    /// Least value strictly greater than `value`, assuming ascending order.
    pub fn next_value(&self, value: &T) -> Option<T> {
        let slice: Vec<T> = (0..self.length).map(|i| self.get(i).expect("in range")).collect();
        let hi = sort::upper_bound(&slice, value, &T::total_order);
        (hi < slice.len()).then(|| slice[hi].clone())
    }

    /// Concatenates `self` and `other` into a new dense array.
    pub fn concat(&self, other: &Self) -> Self {
        let mut values: Vec<T> = (0..self.length).map(|i| self.get(i).expect("in range")).collect();
        values.extend((0..other.length).map(|i| other.get(i).expect("in range")));
        Self::of(values)
    }

    /// Copies `source[from_idx[i]] -> self[to_idx[i]]` for each `i`.
    pub fn update(&mut self, source: &Self, from_idx: &[usize], to_idx: &[usize]) -> Result<()> {
        if from_idx.len() != to_idx.len() {
            return Err(Error::dimension_mismatch(
                format!("{} source indices", from_idx.len()),
                format!("{} destination indices", to_idx.len()),
            ));
        }
        for (&from, &to) in from_idx.iter().zip(to_idx) {
            let value = source.get(from)?;
            self.set(to, value)?;
        }
        Ok(())
    }

    /// Swaps the values at `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        if i == j {
            self.check_bounds(i)?;
            return Ok(());
        }
        let a = self.get(i)?;
        let b = self.get(j)?;
        self.set(i, b)?;
        self.set(j, a)?;
        Ok(())
    }

    /// Randomly permutes the array in place, seeded for reproducibility.
    pub fn shuffle(&mut self, seed: u64) -> Result<()> {
        self.check_writable()?;
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..self.length).rev() {
            let j = rng.gen_range(0..=i);
            self.swap(i, j)?;
        }
        Ok(())
    }

    /// Returns the first-seen distinct values, in encounter order, capped at
    /// `limit` if given.
    pub fn distinct(&self, limit: Option<usize>) -> Self
    where
        T: std::hash::Hash + Eq,
    {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for i in 0..self.length {
            let value = self.get(i).expect("in range");
            if seen.insert(value.clone()) {
                out.push(value);
                if limit.is_some_and(|limit| out.len() >= limit) {
                    break;
                }
            }
        }
        Self::of(out)
    }

    /// A lazy, finite iterator over `range`.
    pub fn stream(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = T> + '_ {
        range.map(move |i| self.get(i).expect("range within bounds"))
    }

    /// Whether the value at `index` is the type's null sentinel.
    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(element_is_null(&self.get(index)?))
    }
}

/// Whether `value` is its type's null sentinel, dispatching to
/// [`ArrayElement::is_null_value`] (overridden for `FLOAT64` so `NaN`
/// compares as null despite `NaN != NaN`).
fn element_is_null<T: ArrayElement>(value: &T) -> bool {
    value.is_null_value()
}

impl<T: ArrayElement + ScalarConvert> TypedArray<T> {
    /// Reads the value at `index`, boxed as a [`Scalar`].
    pub fn get_value(&self, index: usize) -> Result<Scalar> {
        Ok(self.get(index)?.to_scalar())
    }

    /// Writes a boxed [`Scalar`] at `index`,
    /// failing with [`Error::TypeMismatch`] if `value`'s tag doesn't match
    /// this array's element type.
    pub fn set_value(&mut self, index: usize, value: &Scalar) -> Result<Scalar> {
        let typed = T::from_scalar(value)?;
        Ok(self.set(index, typed)?.to_scalar())
    }
}

/// Type-erased, boxable view over a `TypedArray<T>`, used by
/// [`crate::frame::Frame`] to hold heterogeneously typed columns as
/// `Box<dyn AnyArray>`.
///
/// Every accessor defaults through [`PrimitiveAccess`]; calling the accessor
/// that doesn't match a column's actual element type returns
/// [`Error::TypeMismatch`] rather than panicking.
pub trait AnyArray: std::fmt::Debug + Send + Sync {
    /// The underlying `TypeCode`.
    fn type_code(&self) -> TypeCode;
    /// Logical length.
    fn len(&self) -> usize;
    /// Whether the array holds zero elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Whether the array disallows mutation.
    fn is_read_only(&self) -> bool;
    /// Whether the value at `index` is the type's null sentinel.
    fn is_null(&self, index: usize) -> Result<bool>;
    /// Reads the value at `index` as a boxed [`Scalar`].
    fn get_value(&self, index: usize) -> Result<Scalar>;
    /// Writes a boxed [`Scalar`] at `index`, returning the previous value.
    fn set_value(&mut self, index: usize, value: &Scalar) -> Result<Scalar>;
    /// Reads `index` as a `bool`, or `TypeMismatch` if this isn't a `BOOL`
    /// column.
    fn get_bool(&self, index: usize) -> Result<bool>;
    /// Reads `index` as an `i32`, or `TypeMismatch` if this isn't an
    /// `INT32`/`YEAR` column.
    fn get_i32(&self, index: usize) -> Result<i32>;
    /// Reads `index` as an `i64`, or `TypeMismatch` if this isn't an
    /// `INT64`/`INSTANT` column.
    fn get_i64(&self, index: usize) -> Result<i64>;
    /// Reads `index` as an `f64`, or `TypeMismatch` if this isn't a
    /// `FLOAT64` column.
    fn get_f64(&self, index: usize) -> Result<f64>;
    /// Reads `index` widened to `f64` if this column's `TypeCode` is
    /// numeric (`TypeCode::is_numeric`); `None` for every other column,
    /// rather than `TypeMismatch`, since callers (`Frame::numeric_column`,
    /// `Vector::get_f64`) use this to probe a column's numeric-ness.
    fn numeric_at(&self, index: usize) -> Option<f64>;
    /// Writes a `bool` at `index`, or `TypeMismatch` if this isn't a
    /// `BOOL` column.
    fn set_bool(&mut self, index: usize, value: bool) -> Result<bool>;
    /// Writes an `i32` at `index`, or `TypeMismatch` if this isn't an
    /// `INT32`/`YEAR` column.
    fn set_i32(&mut self, index: usize, value: i32) -> Result<i32>;
    /// Writes an `i64` at `index`, or `TypeMismatch` if this isn't an
    /// `INT64`/`INSTANT` column.
    fn set_i64(&mut self, index: usize, value: i64) -> Result<i64>;
    /// Writes an `f64` at `index`, or `TypeMismatch` if this isn't a
    /// `FLOAT64` column.
    fn set_f64(&mut self, index: usize, value: f64) -> Result<f64>;
    /// Grows the array to `new_length`, filling new slots with the default
    /// value.
    fn expand(&mut self, new_length: usize) -> Result<()>;
    /// Deep-copies the whole array behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn AnyArray>;
    /// Downcasts to the concrete `TypedArray<T>`, for callers that already
    /// know the column's element type.
    fn as_any(&self) -> &dyn Any;
    /// Mutable counterpart of [`AnyArray::as_any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ArrayElement + PrimitiveAccess + ScalarConvert> AnyArray for TypedArray<T> {
    fn type_code(&self) -> TypeCode {
        Self::type_code(self)
    }

    fn len(&self) -> usize {
        self.length()
    }

    fn is_read_only(&self) -> bool {
        Self::is_read_only(self)
    }

    fn is_null(&self, index: usize) -> Result<bool> {
        Self::is_null(self, index)
    }

    fn get_value(&self, index: usize) -> Result<Scalar> {
        Self::get_value(self, index)
    }

    fn set_value(&mut self, index: usize, value: &Scalar) -> Result<Scalar> {
        Self::set_value(self, index, value)
    }

    fn get_bool(&self, index: usize) -> Result<bool> {
        self.get(index)?.as_bool().ok_or_else(|| Error::type_mismatch("BOOL", T::TYPE_CODE.name()))
    }

    fn get_i32(&self, index: usize) -> Result<i32> {
        self.get(index)?.as_i32().ok_or_else(|| Error::type_mismatch("INT32", T::TYPE_CODE.name()))
    }

    fn get_i64(&self, index: usize) -> Result<i64> {
        self.get(index)?.as_i64().ok_or_else(|| Error::type_mismatch("INT64", T::TYPE_CODE.name()))
    }

    fn get_f64(&self, index: usize) -> Result<f64> {
        self.get(index)?.as_f64().ok_or_else(|| Error::type_mismatch("FLOAT64", T::TYPE_CODE.name()))
    }

    fn numeric_at(&self, index: usize) -> Option<f64> {
        self.get(index).ok()?.as_numeric()
    }

    fn set_bool(&mut self, index: usize, value: bool) -> Result<bool> {
        let typed = T::from_bool(value).ok_or_else(|| Error::type_mismatch("BOOL", T::TYPE_CODE.name()))?;
        self.set(index, typed)?.as_bool().ok_or_else(|| Error::type_mismatch("BOOL", T::TYPE_CODE.name()))
    }

    fn set_i32(&mut self, index: usize, value: i32) -> Result<i32> {
        let typed = T::from_i32(value).ok_or_else(|| Error::type_mismatch("INT32", T::TYPE_CODE.name()))?;
        self.set(index, typed)?.as_i32().ok_or_else(|| Error::type_mismatch("INT32", T::TYPE_CODE.name()))
    }

    fn set_i64(&mut self, index: usize, value: i64) -> Result<i64> {
        let typed = T::from_i64(value).ok_or_else(|| Error::type_mismatch("INT64", T::TYPE_CODE.name()))?;
        self.set(index, typed)?.as_i64().ok_or_else(|| Error::type_mismatch("INT64", T::TYPE_CODE.name()))
    }

    fn set_f64(&mut self, index: usize, value: f64) -> Result<f64> {
        let typed = T::from_f64(value).ok_or_else(|| Error::type_mismatch("FLOAT64", T::TYPE_CODE.name()))?;
        self.set(index, typed)?.as_f64().ok_or_else(|| Error::type_mismatch("FLOAT64", T::TYPE_CODE.name()))
    }

    fn expand(&mut self, new_length: usize) -> Result<()> {
        Self::expand(self, new_length)
    }

    fn clone_boxed(&self) -> Box<dyn AnyArray> {
        Box::new(self.copy())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: ArrayElement + FixedWidth> TypedArray<T> {
    /// Creates an anonymous memory-mapped array of `length` slots, each
    /// holding `T::default_sentinel()`.
    pub fn mapped(length: usize) -> std::io::Result<Self> {
        let store = backend::MappedStore::new(length, length, T::default_sentinel())?;
        Ok(Self {
            length,
            load_factor: 1.0,
            default_value: T::default_sentinel(),
            backend: Backend::Mapped(store),
            read_only: false,
        })
    }

    /// Opens (or creates) a file-backed mapped array; the mapping survives
    /// a process restart since its byte layout is written through to
    /// `file`.
    pub fn mapped_in_file(file: &std::fs::File, length: usize) -> std::io::Result<Self> {
        let store = backend::MappedStore::create_in_file(file, length, length, T::default_sentinel())?;
        Ok(Self {
            length,
            load_factor: 1.0,
            default_value: T::default_sentinel(),
            backend: Backend::Mapped(store),
            read_only: false,
        })
    }

    /// Re-opens a previously-created file-backed mapped array.
    pub fn open_mapped_file(file: &std::fs::File) -> std::io::Result<Self> {
        let store = backend::MappedStore::open_file(file)?;
        let length = store.capacity();
        Ok(Self {
            length,
            load_factor: 1.0,
            default_value: T::default_sentinel(),
            backend: Backend::Mapped(store),
            read_only: false,
        })
    }

    /// Flushes a mapped array's dirty pages to its backing file, if any.
    pub fn flush(&self) -> std::io::Result<()> {
        match &self.backend {
            Backend::Mapped(store) => store.flush(),
            _ => Ok(()),
        }
    }
}

impl TypedArray<element::ZonedDateTime> {
    /// Creates an anonymous memory-mapped `DATETIME-ZONED` array whose
    /// header embeds `zones` as the zone dictionary `zoneId` indexes into.
    pub fn mapped_zoned(length: usize, zones: Vec<String>) -> std::io::Result<Self> {
        let store =
            backend::MappedStore::new_zoned(length, length, element::ZonedDateTime::default_sentinel(), zones)?;
        Ok(Self {
            length,
            load_factor: 1.0,
            default_value: element::ZonedDateTime::default_sentinel(),
            backend: Backend::Mapped(store),
            read_only: false,
        })
    }

    /// File-backed counterpart of [`Self::mapped_zoned`].
    pub fn mapped_in_file_zoned(
        file: &std::fs::File,
        length: usize,
        zones: Vec<String>,
    ) -> std::io::Result<Self> {
        let store = backend::MappedStore::create_in_file_zoned(
            file,
            length,
            length,
            element::ZonedDateTime::default_sentinel(),
            zones,
        )?;
        Ok(Self {
            length,
            load_factor: 1.0,
            default_value: element::ZonedDateTime::default_sentinel(),
            backend: Backend::Mapped(store),
            read_only: false,
        })
    }

    /// The zone dictionary embedded in a `DATETIME-ZONED` mapped array's
    /// header; `None` for the dense/sparse backends.
    pub fn zone_dictionary(&self) -> std::io::Result<Option<Vec<String>>> {
        match &self.backend {
            Backend::Mapped(store) => store.zone_dictionary().map(Some),
            _ => Ok(None),
        }
    }

    /// Writes the values at `indices` as the self-describing wire stream
    /// from [`crate::io`].
    pub fn write(&self, sink: &mut impl Write, indices: &[usize]) -> std::io::Result<()> {
        let mut values = Vec::with_capacity(indices.len());
        for &i in indices {
            values.push(self.get(i).expect("indices in bounds"));
        }
        crate::io::write_fixed_width(sink, &values)
    }

    /// Reads `n` values from `source`'s wire stream into a new dense array.
    pub fn read(source: &mut impl Read, _n: usize) -> std::io::Result<Self> {
        let values = crate::io::read_fixed_width::<T, _>(source)?;
        Ok(Self::of(values))
    }
}

impl<T: NumericElement> TypedArray<T> {
    /// Streaming statistics over the whole array.
    pub fn stats(&self) -> Stats {
        Stats::new((0..self.length).map(|i| self.get(i).expect("in range").to_f64()))
    }

    /// Left-scan cumulative sum. A `NaN` source element is skipped — the
    /// running sum carries forward unchanged — rather than propagating.
    pub fn cum_sum(&self) -> Vec<f64> {
        let values: Vec<f64> = (0..self.length).map(|i| self.get(i).expect("in range").to_f64()).collect();
        stats::cum_sum(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_get_set_round_trip() {
        let mut arr = TypedArray::<i32>::dense(5);
        arr.set(2, 42).unwrap();
        assert_eq!(arr.get(2).unwrap(), 42);
        assert_eq!(arr.get(0).unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let arr = TypedArray::<i32>::dense(3);
        assert!(matches!(arr.get(3), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn copy_is_independent() {
        let mut arr = TypedArray::<i32>::dense(3);
        arr.set(0, 1).unwrap();
        let mut copy = arr.copy();
        copy.set(0, 99).unwrap();
        assert_eq!(arr.get(0).unwrap(), 1);
        assert_eq!(copy.get(0).unwrap(), 99);
    }

    #[test]
    fn sparse_promotes_to_dense_at_threshold() {
        // capacity 100, load_factor 0.5 -> threshold floor(50) = 50.
        // Promotion requires strictly more than `threshold` live entries, so
        // slots 0..=49 (50 distinct writes) must stay sparse and the 51st
        // distinct write (slot 50) is what promotes.
        let mut arr = TypedArray::<i32>::sparse(100, 100, 0, 0.5);
        for i in 0..=49 {
            arr.set(i, (i + 1) as i32).unwrap();
        }
        assert_eq!(arr.backend_style(), BackendStyle::Sparse);
        arr.set(50, 51).unwrap();
        assert_eq!(arr.backend_style(), BackendStyle::Dense);
        for i in 0..51 {
            assert_eq!(arr.get(i).unwrap(), (i + 1) as i32);
        }
    }

    #[test]
    fn sort_then_binary_search_matches_index() {
        let mut arr = TypedArray::of(vec![5, 3, 8, 1, 9, 2]);
        arr.sort(true, 0..arr.length()).unwrap();
        for i in 0..arr.length() {
            let v = arr.get(i).unwrap();
            assert_eq!(arr.binary_search(&v, 0..arr.length()).unwrap(), i as isize);
        }
        assert_eq!(arr.binary_search(&100, 0..arr.length()).unwrap(), -(arr.length() as isize) - 1);
    }

    #[test]
    fn previous_next_bracket_value() {
        let keys = vec!["a", "c", "e", "g", "i", "k", "m", "o", "q", "s", "u", "w", "y"];
        let arr = TypedArray::of(keys.into_iter().map(Box::<str>::from).collect());
        assert_eq!(arr.previous(&"e".into()), Some("c".into()));
        assert_eq!(arr.previous(&"f".into()), Some("e".into()));
        assert_eq!(arr.next_value(&"i".into()), Some("k".into()));
        assert_eq!(arr.next_value(&"z".into()), None);
    }

    #[test]
    fn nan_sorts_last_ascending() {
        let mut arr = TypedArray::of(vec![3.0, f64::NAN, 1.0, 2.0]);
        arr.sort(true, 0..arr.length()).unwrap();
        assert!(arr.get(3).unwrap().is_nan());
        assert_eq!(arr.get(0).unwrap(), 1.0);
    }

    #[test]
    fn cum_sum_matches_scenario() {
        let arr = TypedArray::of(vec![1.0, 2.0, f64::NAN, 4.0, 5.0]);
        let result = arr.cum_sum();
        assert_eq!(result, vec![1.0, 3.0, 3.0, 7.0, 12.0]);
    }

    #[test]
    fn read_only_rejects_writes() {
        let arr = TypedArray::of(vec![1, 2, 3]).read_only();
        let mut arr = arr;
        assert!(matches!(arr.set(0, 9), Err(Error::ReadOnly { .. })));
    }

    #[test]
    fn distinct_preserves_first_seen_order() {
        let arr = TypedArray::of(vec![3, 1, 3, 2, 1, 4]);
        let distinct = arr.distinct(None);
        assert_eq!((0..distinct.length()).map(|i| distinct.get(i).unwrap()).collect::<Vec<_>>(), vec![3, 1, 2, 4]);
    }

    #[test]
    fn any_array_dispatches_by_erased_type() {
        let mut columns: Vec<Box<dyn AnyArray>> = vec![
            Box::new(TypedArray::of(vec![1_i32, 2, 3])),
            Box::new(TypedArray::of(vec![1.5_f64, 2.5, 3.5])),
        ];
        assert_eq!(columns[0].get_i32(1).unwrap(), 2);
        assert!(matches!(columns[0].get_f64(1), Err(Error::TypeMismatch { .. })));
        assert_eq!(columns[1].get_f64(2).unwrap(), 3.5);

        columns[0].set_value(0, &Scalar::Int32(99)).unwrap();
        assert_eq!(columns[0].get_i32(0).unwrap(), 99);
        assert!(columns[0].set_value(0, &Scalar::Float64(1.0)).is_err());
    }
}
