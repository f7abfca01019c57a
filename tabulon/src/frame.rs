//! [`Frame`]: the columnar table assembled from a row [`Index`], a column
//! [`Index`], and per-column type-erased storage.

use std::collections::HashMap;
use std::hash::Hash;

use rust_decimal::Decimal;

use crate::array::element::{EnumCode, Instant, ObjectCell, Year, ZonedDateTime};
use crate::array::{AnyArray, Stats, TypedArray};
use crate::axis::{Axis, Direction};
use crate::config::{Config, NanStrategy, TieStrategy};
use crate::error::{Error, Result};
use crate::events::{DataFrameEvent, EventBus, EventKind};
use crate::index::Index;
use crate::types::{Scalar, TypeCode};

/// The key bound shared by every row/column key type in this module:
/// `Index`/`Axis` already require it, plus `Debug` for the error taxonomy's
/// key-rendering.
pub trait Key: Eq + Hash + Clone + std::fmt::Debug {}
impl<T: Eq + Hash + Clone + std::fmt::Debug> Key for T {}

/// Builds a freshly allocated, default-filled column for `type_code`.
pub(crate) fn make_column(type_code: TypeCode, length: usize) -> Box<dyn AnyArray> {
    match type_code {
        TypeCode::Bool => Box::new(TypedArray::<bool>::dense(length)),
        TypeCode::Int32 => Box::new(TypedArray::<i32>::dense(length)),
        TypeCode::Int64 => Box::new(TypedArray::<i64>::dense(length)),
        TypeCode::Float64 => Box::new(TypedArray::<f64>::dense(length)),
        TypeCode::Str => Box::new(TypedArray::<Box<str>>::dense(length)),
        TypeCode::Enum => Box::new(TypedArray::<EnumCode>::dense(length)),
        TypeCode::Date => Box::new(TypedArray::<chrono::NaiveDate>::dense(length)),
        TypeCode::DateTimeLocal => Box::new(TypedArray::<chrono::NaiveDateTime>::dense(length)),
        TypeCode::DateTimeZoned => Box::new(TypedArray::<ZonedDateTime>::dense(length)),
        TypeCode::TimeLocal => Box::new(TypedArray::<chrono::NaiveTime>::dense(length)),
        TypeCode::Currency => Box::new(TypedArray::<Decimal>::dense(length)),
        TypeCode::Year => Box::new(TypedArray::<Year>::dense(length)),
        TypeCode::Instant => Box::new(TypedArray::<Instant>::dense(length)),
        TypeCode::Object => Box::new(TypedArray::<ObjectCell>::dense(length)),
    }
}

/// The columnar table.
///
/// Storage slot for column `c` is `columns[colIndex.getIndexForKey(c)]`, and
/// cell `(r,c)` lives at `columns[...][rowIndex.getIndexForKey(r)]` -- both
/// indices address by canonical, never by ordinal, so sorting either axis
/// never moves a single byte of column storage.
#[derive(Debug)]
pub struct Frame<R: Key, C: Key> {
    row_index: Index<R>,
    col_index: Index<C>,
    columns: Vec<Box<dyn AnyArray>>,
    events: EventBus<R, C>,
}

impl<R: Key, C: Key> Frame<R, C> {
    /// A frame with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            row_index: Index::new(),
            col_index: Index::new(),
            columns: Vec::new(),
            events: EventBus::new(),
        }
    }

    /// Builds a frame over `row_keys` and `col_keys`, every column sharing
    /// `type_code`.
    pub fn from_uniform(
        row_keys: impl IntoIterator<Item = R>,
        col_keys: impl IntoIterator<Item = C>,
        type_code: TypeCode,
    ) -> Result<Self> {
        let row_index = Index::from_keys(row_keys)?;
        let col_index = Index::from_keys(col_keys)?;
        let row_count = row_index.len();
        let columns = (0..col_index.len()).map(|_| make_column(type_code, row_count)).collect();
        Ok(Self {
            row_index,
            col_index,
            columns,
            events: EventBus::new(),
        })
    }

    /// Builds a frame over `row_keys`, with columns supplied explicitly as
    /// `(key, storage)` pairs, each already sized to `row_keys`' length.
    pub fn from_builder(row_keys: impl IntoIterator<Item = R>, columns: Vec<(C, Box<dyn AnyArray>)>) -> Result<Self> {
        let row_index = Index::from_keys(row_keys)?;
        let mut col_keys = Vec::with_capacity(columns.len());
        let mut storage = Vec::with_capacity(columns.len());
        for (key, column) in columns {
            if column.len() != row_index.len() {
                return Err(Error::dimension_mismatch(
                    format!("{} rows", row_index.len()),
                    format!("{} rows in column {:?}", column.len(), key),
                ));
            }
            col_keys.push(key);
            storage.push(column);
        }
        let col_index = Index::from_keys(col_keys)?;
        Ok(Self {
            row_index,
            col_index,
            columns: storage,
            events: EventBus::new(),
        })
    }

    /// Deep-copies the whole frame: independent row/column indices, cloned
    /// column storage, and a fresh, disabled event bus (listeners are not
    /// carried over -- they observe a specific frame instance).
    pub fn copy(&self) -> Self {
        Self {
            row_index: self.row_index.copy(),
            col_index: self.col_index.copy(),
            columns: self.columns.iter().map(|c| c.clone_boxed()).collect(),
            events: EventBus::new(),
        }
    }

    /// The event bus, for subscribing listeners and toggling `enabled`.
    pub fn events_mut(&mut self) -> &mut EventBus<R, C> {
        &mut self.events
    }

    // ---- Structure -----------------------------------------------------

    /// Live row count.
    pub fn row_count(&self) -> usize {
        self.row_index.len()
    }

    /// Live column count.
    pub fn col_count(&self) -> usize {
        self.col_index.len()
    }

    /// An independent view over the row dimension. Sorting/filtering the returned [`Axis`] never mutates this
    /// frame; it shares the row key table copy-on-write.
    pub fn rows(&self) -> Axis<R> {
        Axis::new(self.row_index.clone(), Direction::Rows)
    }

    /// An independent view over the column dimension.
    pub fn cols(&self) -> Axis<C> {
        Axis::new(self.col_index.clone(), Direction::Cols)
    }

    /// The content accessor: column storage in canonical order.
    pub fn data(&self) -> &[Box<dyn AnyArray>] {
        &self.columns
    }

    /// The row index, for crate-internal consumers ([`crate::cursor`]) that
    /// need to resolve ordinal/canonical positions directly.
    pub(crate) fn row_index(&self) -> &Index<R> {
        &self.row_index
    }

    /// The column index, counterpart of [`Frame::row_index`].
    pub(crate) fn col_index(&self) -> &Index<C> {
        &self.col_index
    }

    // ---- Access ----------------------------------------------------------

    fn cell_canonical(&self, row: &R, col: &C) -> Result<(usize, usize)> {
        Ok((self.row_index.get_index_for_key(row)?, self.col_index.get_index_for_key(col)?))
    }

    fn cell_ordinal(&self, row_ord: usize, col_ord: usize) -> Result<(usize, usize)> {
        Ok((self.row_index.canonical_at(row_ord)?, self.col_index.canonical_at(col_ord)?))
    }

    /// Reads cell `(row, col)` as `bool`.
    pub fn get_bool(&self, row: &R, col: &C) -> Result<bool> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        self.columns[col_c].get_bool(row_c)
    }

    /// Reads cell `(row, col)` as `i32`.
    pub fn get_i32(&self, row: &R, col: &C) -> Result<i32> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        self.columns[col_c].get_i32(row_c)
    }

    /// Reads cell `(row, col)` as `i64`.
    pub fn get_i64(&self, row: &R, col: &C) -> Result<i64> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        self.columns[col_c].get_i64(row_c)
    }

    /// Reads cell `(row, col)` as `f64`.
    pub fn get_f64(&self, row: &R, col: &C) -> Result<f64> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        self.columns[col_c].get_f64(row_c)
    }

    /// Reads cell `(row, col)` as a boxed [`Scalar`].
    pub fn get_value(&self, row: &R, col: &C) -> Result<Scalar> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        self.columns[col_c].get_value(row_c)
    }

    /// Ordinal-addressed counterpart of [`Frame::get_bool`].
    pub fn get_bool_at(&self, row_ord: usize, col_ord: usize) -> Result<bool> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].get_bool(row_c)
    }

    /// Ordinal-addressed counterpart of [`Frame::get_i32`].
    pub fn get_i32_at(&self, row_ord: usize, col_ord: usize) -> Result<i32> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].get_i32(row_c)
    }

    /// Ordinal-addressed counterpart of [`Frame::get_i64`].
    pub fn get_i64_at(&self, row_ord: usize, col_ord: usize) -> Result<i64> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].get_i64(row_c)
    }

    /// Ordinal-addressed counterpart of [`Frame::get_f64`].
    pub fn get_f64_at(&self, row_ord: usize, col_ord: usize) -> Result<f64> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].get_f64(row_c)
    }

    /// Ordinal-addressed counterpart of [`Frame::get_value`].
    pub fn get_value_at(&self, row_ord: usize, col_ord: usize) -> Result<Scalar> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].get_value(row_c)
    }

    fn ordinal_keys(&self, row_ord: usize, col_ord: usize) -> Result<(R, C)> {
        Ok((self.row_index.get_key(row_ord)?, self.col_index.get_key(col_ord)?))
    }

    /// Ordinal-addressed counterpart of [`Frame::set_bool`]. Used by
    /// [`crate::cursor::Cursor`], which caches ordinals rather than keys.
    pub fn set_bool_at(&mut self, row_ord: usize, col_ord: usize, value: bool) -> Result<bool> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        let previous = self.columns[col_c].set_bool(row_c, value)?;
        let (row, col) = self.ordinal_keys(row_ord, col_ord)?;
        self.fire_update(row, col);
        Ok(previous)
    }

    /// Ordinal-addressed counterpart of [`Frame::set_i32`].
    pub fn set_i32_at(&mut self, row_ord: usize, col_ord: usize, value: i32) -> Result<i32> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        let previous = self.columns[col_c].set_i32(row_c, value)?;
        let (row, col) = self.ordinal_keys(row_ord, col_ord)?;
        self.fire_update(row, col);
        Ok(previous)
    }

    /// Ordinal-addressed counterpart of [`Frame::set_i64`].
    pub fn set_i64_at(&mut self, row_ord: usize, col_ord: usize, value: i64) -> Result<i64> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        let previous = self.columns[col_c].set_i64(row_c, value)?;
        let (row, col) = self.ordinal_keys(row_ord, col_ord)?;
        self.fire_update(row, col);
        Ok(previous)
    }

    /// Ordinal-addressed counterpart of [`Frame::set_f64`].
    pub fn set_f64_at(&mut self, row_ord: usize, col_ord: usize, value: f64) -> Result<f64> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        let previous = self.columns[col_c].set_f64(row_c, value)?;
        let (row, col) = self.ordinal_keys(row_ord, col_ord)?;
        self.fire_update(row, col);
        Ok(previous)
    }

    /// Ordinal-addressed counterpart of [`Frame::set_value`].
    pub fn set_value_at(&mut self, row_ord: usize, col_ord: usize, value: &Scalar) -> Result<Scalar> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        let previous = self.columns[col_c].set_value(row_c, value)?;
        let (row, col) = self.ordinal_keys(row_ord, col_ord)?;
        self.fire_update(row, col);
        Ok(previous)
    }

    /// Whether cell `(row_ord, col_ord)` holds its column's null sentinel.
    pub fn is_null_at(&self, row_ord: usize, col_ord: usize) -> Result<bool> {
        let (row_c, col_c) = self.cell_ordinal(row_ord, col_ord)?;
        self.columns[col_c].is_null(row_c)
    }

    fn fire_update(&mut self, row: R, col: C) {
        self.events.fire(DataFrameEvent {
            kind: EventKind::Update,
            row_keys: vec![row],
            col_keys: vec![col],
        });
    }

    /// Writes `value` at cell `(row, col)`, returning the previous value.
    pub fn set_bool(&mut self, row: &R, col: &C, value: bool) -> Result<bool> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        let previous = self.columns[col_c].set_bool(row_c, value)?;
        self.fire_update(row.clone(), col.clone());
        Ok(previous)
    }

    /// Writes `value` at cell `(row, col)`, returning the previous value.
    pub fn set_i32(&mut self, row: &R, col: &C, value: i32) -> Result<i32> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        let previous = self.columns[col_c].set_i32(row_c, value)?;
        self.fire_update(row.clone(), col.clone());
        Ok(previous)
    }

    /// Writes `value` at cell `(row, col)`, returning the previous value.
    pub fn set_i64(&mut self, row: &R, col: &C, value: i64) -> Result<i64> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        let previous = self.columns[col_c].set_i64(row_c, value)?;
        self.fire_update(row.clone(), col.clone());
        Ok(previous)
    }

    /// Writes `value` at cell `(row, col)`, returning the previous value.
    pub fn set_f64(&mut self, row: &R, col: &C, value: f64) -> Result<f64> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        let previous = self.columns[col_c].set_f64(row_c, value)?;
        self.fire_update(row.clone(), col.clone());
        Ok(previous)
    }

    /// Writes a boxed [`Scalar`] at cell `(row, col)`, returning the previous
    /// value.
    pub fn set_value(&mut self, row: &R, col: &C, value: &Scalar) -> Result<Scalar> {
        let (row_c, col_c) = self.cell_canonical(row, col)?;
        let previous = self.columns[col_c].set_value(row_c, value)?;
        self.fire_update(row.clone(), col.clone());
        Ok(previous)
    }

    fn set_value_canonical(&mut self, row_c: usize, col_c: usize, value: &Scalar) -> Result<Scalar> {
        self.columns[col_c].set_value(row_c, value)
    }

    // ---- Row/column insertion --------------------------------------------

    /// Inserts `key` as a new row, expanding every column to the new row
    /// count (new slots hold each column's default value). Honors
    /// [`Config::current`]'s duplicate policy like [`Index::add`]; fires
    /// `ADD` if the row was actually new.
    pub fn add_row(&mut self, key: R) -> Result<usize> {
        let before = self.row_index.len();
        let canonical = self.row_index.add(key.clone())?;
        if self.row_index.len() > before {
            let new_len = self.row_index.len();
            for column in &mut self.columns {
                column.expand(new_len)?;
            }
            self.events.fire(DataFrameEvent {
                kind: EventKind::Add,
                row_keys: vec![key],
                col_keys: vec![],
            });
        }
        Ok(canonical)
    }

    /// Inserts `key` as a new column of `type_code`, default-filled to the
    /// current row count. Fires `ADD` if the column was actually new.
    pub fn add_column(&mut self, key: C, type_code: TypeCode) -> Result<usize> {
        let before = self.col_index.len();
        let canonical = self.col_index.add(key.clone())?;
        if self.col_index.len() > before {
            self.columns.push(make_column(type_code, self.row_index.len()));
            self.events.fire(DataFrameEvent {
                kind: EventKind::Add,
                row_keys: vec![],
                col_keys: vec![key],
            });
        }
        Ok(canonical)
    }

    // ---- Transform: key-level ---------------------------------------------

    /// Maps every row key through `mapper(oldKey, ordinal, canonical)`,
    /// preserving column storage untouched.
    pub fn map_row_keys<R2: Key>(&self, mapper: impl Fn(&R, usize, usize) -> R2) -> Result<Frame<R2, C>> {
        Ok(Frame {
            row_index: self.row_index.map(mapper)?,
            col_index: self.col_index.clone(),
            columns: self.columns.iter().map(|c| c.clone_boxed()).collect(),
            events: EventBus::new(),
        })
    }

    /// Maps every column key through `mapper(oldKey, ordinal, canonical)`.
    pub fn map_col_keys<C2: Key>(&self, mapper: impl Fn(&C, usize, usize) -> C2) -> Result<Frame<R, C2>> {
        Ok(Frame {
            row_index: self.row_index.clone(),
            col_index: self.col_index.map(mapper)?,
            columns: self.columns.iter().map(|c| c.clone_boxed()).collect(),
            events: EventBus::new(),
        })
    }

    /// Rebinds `existing`'s canonical row index to `replacement`.
    pub fn replace_row_key(&mut self, existing: &R, replacement: R) -> Result<()> {
        self.row_index.replace(existing, replacement)
    }

    /// Rebinds `existing`'s canonical column index to `replacement`.
    pub fn replace_col_key(&mut self, existing: &C, replacement: C) -> Result<()> {
        self.col_index.replace(existing, replacement)
    }

    // ---- Numeric column helpers --------------------------------------------

    fn column_canonical(&self, col: &C) -> Result<usize> {
        self.col_index.get_index_for_key(col)
    }

    /// Reads every live row of `col`, in ordinal order, widened to `f64`.
    /// Fails with [`Error::NonNumeric`] if `col` isn't a numeric `TypeCode`.
    pub fn numeric_column(&self, col: &C) -> Result<Vec<f64>> {
        let col_c = self.column_canonical(col)?;
        let column = &self.columns[col_c];
        if !column.type_code().is_numeric() {
            return Err(Error::NonNumeric { column: format!("{col:?}") });
        }
        (0..self.row_index.len())
            .map(|ord| {
                let row_c = self.row_index.canonical_at(ord)?;
                column
                    .numeric_at(row_c)
                    .ok_or_else(|| Error::NonNumeric { column: format!("{col:?}") })
            })
            .collect()
    }

    /// Streaming statistics over `col`.
    pub fn describe(&self, col: &C) -> Result<Stats> {
        Ok(Stats::new(self.numeric_column(col)?.into_iter()))
    }

    /// Equal-width histogram of `col` into `bin_count` bins spanning
    /// `[min, max]`.
    pub fn hist(&self, col: &C, bin_count: usize) -> Result<Vec<usize>> {
        let values = self.numeric_column(col)?;
        let mut bins = vec![0usize; bin_count.max(1)];
        if values.is_empty() || bin_count == 0 {
            return Ok(bins);
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min { (max - min) / bin_count as f64 } else { 1.0 };
        for value in values {
            if value.is_nan() {
                continue;
            }
            let slot = if max > min {
                (((value - min) / width) as usize).min(bin_count - 1)
            } else {
                0
            };
            bins[slot] += 1;
        }
        Ok(bins)
    }

    /// Groups live row ordinals by `col`'s value equality, per distinct
    /// value.
    pub fn group_by_column(&self, col: &C) -> Result<HashMap<String, Vec<usize>>> {
        let col_c = self.column_canonical(col)?;
        let column = &self.columns[col_c];
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let key = format!("{:?}", column.get_value(row_c)?);
            groups.entry(key).or_default().push(ord);
        }
        Ok(groups)
    }

    /// Applies `f(current)` to every live row of a `BOOL` column, in place.
    pub fn apply_bools(&mut self, col: &C, mut f: impl FnMut(bool) -> bool) -> Result<()> {
        let col_c = self.column_canonical(col)?;
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let current = self.columns[col_c].get_bool(row_c)?;
            self.columns[col_c].set_bool(row_c, f(current))?;
        }
        Ok(())
    }

    /// Applies `f(current)` to every live row of an `INT32`/`YEAR` column, in
    /// place.
    pub fn apply_ints(&mut self, col: &C, mut f: impl FnMut(i32) -> i32) -> Result<()> {
        let col_c = self.column_canonical(col)?;
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let current = self.columns[col_c].get_i32(row_c)?;
            self.columns[col_c].set_i32(row_c, f(current))?;
        }
        Ok(())
    }

    /// Applies `f(current)` to every live row of an `INT64`/`INSTANT` column,
    /// in place.
    pub fn apply_longs(&mut self, col: &C, mut f: impl FnMut(i64) -> i64) -> Result<()> {
        let col_c = self.column_canonical(col)?;
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let current = self.columns[col_c].get_i64(row_c)?;
            self.columns[col_c].set_i64(row_c, f(current))?;
        }
        Ok(())
    }

    /// Applies `f(current)` to every live row of a `FLOAT64` column, in place.
    pub fn apply_doubles(&mut self, col: &C, mut f: impl FnMut(f64) -> f64) -> Result<()> {
        let col_c = self.column_canonical(col)?;
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let current = self.columns[col_c].get_f64(row_c)?;
            self.columns[col_c].set_f64(row_c, f(current))?;
        }
        Ok(())
    }

    /// Applies `f(current)` to every live row of `col`, regardless of
    /// `TypeCode`, through the boxed [`Scalar`] boundary.
    pub fn apply_values(&mut self, col: &C, mut f: impl FnMut(Scalar) -> Scalar) -> Result<()> {
        let col_c = self.column_canonical(col)?;
        for ord in 0..self.row_index.len() {
            let row_c = self.row_index.canonical_at(ord)?;
            let current = self.columns[col_c].get_value(row_c)?;
            self.columns[col_c].set_value(row_c, &f(current))?;
        }
        Ok(())
    }

    /// Subtracts `col`'s mean from every live row. Writes back in place when
    /// `in_place`; always returns the demeaned values in ordinal order.
    pub fn demean(&mut self, col: &C, in_place: bool) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        if values.is_empty() {
            return Ok(values);
        }
        let mean = values.iter().copied().sum::<f64>() / values.len() as f64;
        let demeaned: Vec<f64> = values.iter().map(|v| v - mean).collect();
        if in_place {
            let col_c = self.column_canonical(col)?;
            for (ord, &value) in demeaned.iter().enumerate() {
                let row_c = self.row_index.canonical_at(ord)?;
                self.columns[col_c].set_f64(row_c, value)?;
            }
        }
        Ok(demeaned)
    }

    /// Fractional rank of every live row of `col`, honoring
    /// [`Config::current`]'s NaN and tie strategies.
    pub fn rank(&self, col: &C) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        let cfg = Config::current();
        Ok(rank_values(&values, cfg.nan_strategy, cfg.tie_strategy))
    }

    /// Period-over-period percent change: `(v[i] - v[i-1]) / v[i-1]`; index 0
    /// is `NaN` (no prior value).
    pub fn percent_changes(&self, col: &C) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        Ok(percent_changes(&values))
    }

    /// Cumulative return from the first live row: `v[i] / v[0] - 1`.
    pub fn cum_returns(&self, col: &C) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        if values.is_empty() {
            return Ok(values);
        }
        let base = values[0];
        Ok(values.iter().map(|v| v / base - 1.0).collect())
    }

    /// Period-over-period log return: `ln(v[i] / v[i-1])`; index 0 is `NaN`.
    pub fn log_returns(&self, col: &C) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        let mut out = vec![f64::NAN; values.len()];
        for i in 1..values.len() {
            out[i] = (values[i] / values[i - 1]).ln();
        }
        Ok(out)
    }

    /// Simple moving average over a trailing window of `window` rows; the
    /// first `window - 1` entries are `NaN` (insufficient history).
    pub fn sma(&self, col: &C, window: usize) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        Ok(simple_moving_average(&values, window))
    }

    /// Exponential moving average with smoothing factor `alpha = 2 / (span +
    /// 1)`, seeded with the first value.
    pub fn ema(&self, col: &C, span: usize) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        Ok(exponential_moving_average(&values, span))
    }

    /// Sample standard deviation. With `window = None`, one value over the
    /// whole column; with `Some(window)`, a rolling standard deviation over
    /// each trailing window (the first `window - 1` entries are `NaN`).
    pub fn std_dev(&self, col: &C, window: Option<usize>) -> Result<Vec<f64>> {
        let values = self.numeric_column(col)?;
        match window {
            None => Ok(vec![Stats::new(values.iter().copied()).std_dev(); values.len()]),
            Some(window) => Ok(rolling_std_dev(&values, window)),
        }
    }

    /// Concatenates `frames` row-wise: every frame must share the same
    /// column layout. Row keys across frames must be collectively distinct
    /// under the ambient duplicate policy.
    pub fn concat_rows(frames: &[&Frame<R, C>]) -> Result<Frame<R, C>> {
        let first = frames
            .first()
            .ok_or_else(|| Error::dimension_mismatch("at least one frame", "zero frames"))?;
        let mut result = (*first).copy();
        for frame in &frames[1..] {
            if frame.col_index.keys() != first.col_index.keys() {
                return Err(Error::dimension_mismatch("column layout", "mismatched column layout"));
            }
            for row_key in frame.row_index.keys() {
                result.add_row(row_key)?;
            }
            for row_key in frame.row_index.keys() {
                let dest_row_c = result.row_index.get_index_for_key(&row_key)?;
                let src_row_c = frame.row_index.get_index_for_key(&row_key)?;
                for col_key in frame.col_index.keys() {
                    let dest_col_c = result.col_index.get_index_for_key(&col_key)?;
                    let src_col_c = frame.col_index.get_index_for_key(&col_key)?;
                    let value = frame.columns[src_col_c].get_value(src_row_c)?;
                    result.set_value_canonical(dest_row_c, dest_col_c, &value)?;
                }
            }
        }
        Ok(result)
    }

    /// Concatenates `frames` column-wise: every frame must share the same
    /// row keys.
    pub fn concat_columns(frames: &[&Frame<R, C>]) -> Result<Frame<R, C>> {
        let first = frames
            .first()
            .ok_or_else(|| Error::dimension_mismatch("at least one frame", "zero frames"))?;
        let mut result = (*first).copy();
        for frame in &frames[1..] {
            if frame.row_index.keys() != first.row_index.keys() {
                return Err(Error::dimension_mismatch("row layout", "mismatched row layout"));
            }
            for col_key in frame.col_index.keys() {
                let src_col_c = frame.col_index.get_index_for_key(&col_key)?;
                result.add_column(col_key.clone(), frame.columns[src_col_c].type_code())?;
                let dest_col_c = result.col_index.get_index_for_key(&col_key)?;
                for row_key in frame.row_index.keys() {
                    let dest_row_c = result.row_index.get_index_for_key(&row_key)?;
                    let src_row_c = frame.row_index.get_index_for_key(&row_key)?;
                    let value = frame.columns[src_col_c].get_value(src_row_c)?;
                    result.set_value_canonical(dest_row_c, dest_col_c, &value)?;
                }
            }
        }
        Ok(result)
    }

    /// Merges `frames`, taking the first non-null value across inputs for
    /// every `(row, col)`. The result's
    /// row/column keys are the union across inputs, in first-appearance
    /// order; a column key appearing in more than one frame must carry the
    /// same `TypeCode` everywhere.
    pub fn combine_first(frames: &[&Frame<R, C>]) -> Result<Frame<R, C>> {
        let mut row_keys = Vec::new();
        let mut seen_rows = std::collections::HashSet::new();
        let mut col_plan: Vec<(C, TypeCode)> = Vec::new();
        let mut seen_cols = HashMap::new();

        for frame in frames {
            for row_key in frame.row_index.keys() {
                if seen_rows.insert(row_key.clone()) {
                    row_keys.push(row_key);
                }
            }
            for col_key in frame.col_index.keys() {
                let col_c = frame.col_index.get_index_for_key(&col_key)?;
                let type_code = frame.columns[col_c].type_code();
                match seen_cols.get(&col_key) {
                    None => {
                        seen_cols.insert(col_key.clone(), type_code);
                        col_plan.push((col_key, type_code));
                    }
                    Some(&existing) if existing != type_code => {
                        return Err(Error::dimension_mismatch(existing.name(), type_code.name()));
                    }
                    Some(_) => {}
                }
            }
        }

        let row_index = Index::from_keys(row_keys)?;
        let row_count = row_index.len();
        let mut col_index = Index::new();
        let mut columns = Vec::with_capacity(col_plan.len());
        for (col_key, type_code) in &col_plan {
            col_index.add(col_key.clone())?;
            columns.push(make_column(*type_code, row_count));
        }

        let mut result = Frame {
            row_index,
            col_index,
            columns,
            events: EventBus::new(),
        };

        for (col_key, _) in &col_plan {
            let dest_col_c = result.col_index.get_index_for_key(col_key)?;
            for row_key in result.row_index.keys() {
                let dest_row_c = result.row_index.get_index_for_key(&row_key)?;
                for frame in frames {
                    if !frame.row_index.contains(&row_key) || !frame.col_index.contains(col_key) {
                        continue;
                    }
                    let src_row_c = frame.row_index.get_index_for_key(&row_key)?;
                    let src_col_c = frame.col_index.get_index_for_key(col_key)?;
                    if frame.columns[src_col_c].is_null(src_row_c)? {
                        continue;
                    }
                    let value = frame.columns[src_col_c].get_value(src_row_c)?;
                    result.set_value_canonical(dest_row_c, dest_col_c, &value)?;
                    break;
                }
            }
        }

        Ok(result)
    }
}

/// Fractional ranking over `values`, honoring `nan_strategy`/`tie_strategy`.
///
/// Ties (including among `NaN`s, when grouped together by `nan_strategy`)
/// share a rank chosen by `tie_strategy`: the lowest, the highest, or the
/// mean rank across the tied run.
pub(crate) fn rank_values(values: &[f64], nan_strategy: NanStrategy, tie_strategy: TieStrategy) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let (va, vb) = (values[a], values[b]);
        match (va.is_nan(), vb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => match nan_strategy {
                NanStrategy::Min => std::cmp::Ordering::Less,
                NanStrategy::Max => std::cmp::Ordering::Greater,
            },
            (false, true) => match nan_strategy {
                NanStrategy::Min => std::cmp::Ordering::Greater,
                NanStrategy::Max => std::cmp::Ordering::Less,
            },
            (false, false) => va.total_cmp(&vb),
        }
    });

    let mut ranks = vec![0.0_f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]].total_cmp(&values[order[i]]) == std::cmp::Ordering::Equal {
            j += 1;
        }
        // Tied run is order[i..j], 0-based; ranks are 1-based.
        let (lo, hi) = (i + 1, j);
        let rank = match tie_strategy {
            TieStrategy::Min => lo as f64,
            TieStrategy::Max => hi as f64,
            TieStrategy::Average => (lo + hi) as f64 / 2.0,
        };
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

fn percent_changes(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        out[i] = (values[i] - values[i - 1]) / values[i - 1];
    }
    out
}

fn simple_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for i in window.saturating_sub(1)..values.len() {
        let start = i + 1 - window;
        out[i] = values[start..=i].iter().sum::<f64>() / window as f64;
    }
    out
}

fn exponential_moving_average(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if values.is_empty() {
        return out;
    }
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    out[0] = values[0];
    for i in 1..values.len() {
        out[i] = alpha * values[i] + (1.0 - alpha) * out[i - 1];
    }
    out
}

fn rolling_std_dev(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window < 2 {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[(i + 1 - window)..=i];
        out[i] = Stats::new(slice.iter().copied()).std_dev();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip_by_key_and_ordinal() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1"], ["c0"], TypeCode::Float64).unwrap();
        frame.set_f64(&"r0", &"c0", 1.5).unwrap();
        assert_eq!(frame.get_f64(&"r0", &"c0").unwrap(), 1.5);
        assert_eq!(frame.get_f64_at(0, 0).unwrap(), 1.5);
        assert!(matches!(frame.get_f64(&"missing", &"c0"), Err(Error::KeyNotFound { .. })));
    }

    #[test]
    fn add_row_expands_every_column_with_defaults() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0"], ["c0"], TypeCode::Int32).unwrap();
        frame.set_i32(&"r0", &"c0", 7).unwrap();
        frame.add_row("r1").unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.get_i32(&"r1", &"c0").unwrap(), 0);
        assert_eq!(frame.get_i32(&"r0", &"c0").unwrap(), 7);
    }

    #[test]
    fn sorting_an_axis_view_does_not_mutate_the_frame() {
        let frame = Frame::<&str, &str>::from_uniform(["b", "a", "c"], ["c0"], TypeCode::Int32).unwrap();
        let mut view = frame.rows();
        view.sort(true).unwrap();
        assert_eq!(view.keys(), vec!["a", "b", "c"]);
        assert_eq!(frame.rows().keys(), vec!["b", "a", "c"]);
    }

    #[test]
    fn events_fire_add_then_update() {
        let received = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut frame = Frame::<&str, &str>::from_uniform(["r0"], ["c0"], TypeCode::Int32).unwrap();
        frame.events_mut().set_enabled(true);
        let sink = received.clone();
        frame.events_mut().subscribe(move |event| sink.lock().unwrap().push(event.kind));
        frame.add_row("r1").unwrap();
        frame.set_i32(&"r0", &"c0", 5).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![EventKind::Add, EventKind::Update]);
    }

    #[test]
    fn concat_rows_unions_matching_column_layouts() {
        let a = Frame::<&str, &str>::from_uniform(["r0"], ["c0"], TypeCode::Int32).unwrap();
        let mut b = Frame::<&str, &str>::from_uniform(["r1"], ["c0"], TypeCode::Int32).unwrap();
        b.set_i32(&"r1", &"c0", 9).unwrap();
        let combined = Frame::concat_rows(&[&a, &b]).unwrap();
        assert_eq!(combined.row_count(), 2);
        assert_eq!(combined.get_i32(&"r1", &"c0").unwrap(), 9);
    }

    #[test]
    fn concat_columns_unions_matching_row_layouts() {
        let a = Frame::<&str, &str>::from_uniform(["r0", "r1"], ["c0"], TypeCode::Int32).unwrap();
        let mut b = Frame::<&str, &str>::from_uniform(["r0", "r1"], ["c1"], TypeCode::Int32).unwrap();
        b.set_i32(&"r0", &"c1", 3).unwrap();
        let combined = Frame::concat_columns(&[&a, &b]).unwrap();
        assert_eq!(combined.col_count(), 2);
        assert_eq!(combined.get_i32(&"r0", &"c1").unwrap(), 3);
    }

    #[test]
    fn combine_first_takes_first_non_null_across_frames() {
        let mut a = Frame::<&str, &str>::from_uniform(["r0"], ["c0"], TypeCode::Float64).unwrap();
        // Leave a's c0 at its default NaN sentinel -- "null".
        let mut b = Frame::<&str, &str>::from_uniform(["r0"], ["c0"], TypeCode::Float64).unwrap();
        b.set_f64(&"r0", &"c0", 42.0).unwrap();
        let combined = Frame::combine_first(&[&a, &b]).unwrap();
        assert_eq!(combined.get_f64(&"r0", &"c0").unwrap(), 42.0);

        a.set_f64(&"r0", &"c0", 1.0).unwrap();
        let combined = Frame::combine_first(&[&a, &b]).unwrap();
        assert_eq!(combined.get_f64(&"r0", &"c0").unwrap(), 1.0);
    }

    #[test]
    fn combine_first_of_single_frame_is_identity() {
        let mut a = Frame::<&str, &str>::from_uniform(["r0", "r1"], ["c0"], TypeCode::Int32).unwrap();
        a.set_i32(&"r0", &"c0", 1).unwrap();
        a.set_i32(&"r1", &"c0", 2).unwrap();
        let combined = Frame::combine_first(&[&a]).unwrap();
        assert_eq!(combined.get_i32(&"r0", &"c0").unwrap(), 1);
        assert_eq!(combined.get_i32(&"r1", &"c0").unwrap(), 2);
    }

    #[test]
    fn demean_subtracts_the_mean_in_place() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2"], ["c0"], TypeCode::Float64).unwrap();
        frame.set_f64(&"r0", &"c0", 1.0).unwrap();
        frame.set_f64(&"r1", &"c0", 2.0).unwrap();
        frame.set_f64(&"r2", &"c0", 3.0).unwrap();
        let demeaned = frame.demean(&"c0", true).unwrap();
        assert_eq!(demeaned, vec![-1.0, 0.0, 1.0]);
        assert_eq!(frame.get_f64(&"r0", &"c0").unwrap(), -1.0);
    }

    #[test]
    fn rank_breaks_ties_by_average() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2", "r3"], ["c0"], TypeCode::Float64).unwrap();
        frame.set_f64(&"r0", &"c0", 10.0).unwrap();
        frame.set_f64(&"r1", &"c0", 20.0).unwrap();
        frame.set_f64(&"r2", &"c0", 20.0).unwrap();
        frame.set_f64(&"r3", &"c0", 30.0).unwrap();
        let ranks = frame.rank(&"c0").unwrap();
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn percent_and_log_and_cum_returns_match_scenario() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2"], ["c0"], TypeCode::Float64).unwrap();
        frame.set_f64(&"r0", &"c0", 100.0).unwrap();
        frame.set_f64(&"r1", &"c0", 110.0).unwrap();
        frame.set_f64(&"r2", &"c0", 99.0).unwrap();

        let pct = frame.percent_changes(&"c0").unwrap();
        assert!(pct[0].is_nan());
        assert!((pct[1] - 0.10).abs() < 1e-9);
        assert!((pct[2] - (-0.10)).abs() < 1e-9);

        let cum = frame.cum_returns(&"c0").unwrap();
        assert_eq!(cum[0], 0.0);
        assert!((cum[2] - (-0.01)).abs() < 1e-9);

        let log = frame.log_returns(&"c0").unwrap();
        assert!(log[0].is_nan());
        assert!((log[1] - (110.0_f64 / 100.0).ln()).abs() < 1e-9);
    }

    #[test]
    fn sma_and_ema_pad_leading_nan_and_track_values() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2", "r3"], ["c0"], TypeCode::Float64).unwrap();
        for (row, value) in [("r0", 1.0), ("r1", 2.0), ("r2", 3.0), ("r3", 4.0)] {
            frame.set_f64(&row, &"c0", value).unwrap();
        }
        let sma = frame.sma(&"c0", 2).unwrap();
        assert!(sma[0].is_nan());
        assert_eq!(sma[1], 1.5);
        assert_eq!(sma[3], 3.5);

        let ema = frame.ema(&"c0", 3).unwrap();
        assert_eq!(ema[0], 1.0);
        assert!(ema[3] > ema[0]);
    }

    #[test]
    fn hist_counts_values_into_equal_width_bins() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2", "r3"], ["c0"], TypeCode::Float64).unwrap();
        for (row, value) in [("r0", 0.0), ("r1", 1.0), ("r2", 2.0), ("r3", 3.0)] {
            frame.set_f64(&row, &"c0", value).unwrap();
        }
        let bins = frame.hist(&"c0", 2).unwrap();
        assert_eq!(bins, vec![2, 2]);
    }

    #[test]
    fn std_dev_windowed_pads_leading_nan() {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2", "r3"], ["c0"], TypeCode::Float64).unwrap();
        for (row, value) in [("r0", 1.0), ("r1", 2.0), ("r2", 3.0), ("r3", 4.0)] {
            frame.set_f64(&row, &"c0", value).unwrap();
        }
        let rolling = frame.std_dev(&"c0", Some(2)).unwrap();
        assert!(rolling[0].is_nan());
        assert!(rolling[1] > 0.0);

        let whole = frame.std_dev(&"c0", None).unwrap();
        assert!(whole.iter().all(|&v| (v - whole[0]).abs() < 1e-12));
    }
}
