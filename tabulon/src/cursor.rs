//! [`Cursor`] and [`Vector`]: movable, single-threaded accessors into a
//! [`Frame`].
//!
//! Both are value-based rather than holding a live reference into the
//! frame's internals: every movement or read/write method takes the frame
//! as an argument and re-resolves positions against it, so neither type can
//! observe a stale canonical index for a key that was replaced since the
//! last call.

use crate::error::{Error, Result};
use crate::frame::{Frame, Key};
use crate::types::Scalar;
use crate::array::Stats;

/// A movable `(row, column)` position into a [`Frame`], resolved by
/// ordinal rather than by key.
///
/// Single-threaded: callers that need concurrent access create one cursor
/// per thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    row_ord: Option<usize>,
    col_ord: Option<usize>,
}

impl Cursor {
    /// A cursor positioned nowhere; every read/write fails until moved.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cursor's current row ordinal, if positioned.
    pub fn row_ordinal(&self) -> Option<usize> {
        self.row_ord
    }

    /// The cursor's current column ordinal, if positioned.
    pub fn col_ordinal(&self) -> Option<usize> {
        self.col_ord
    }

    fn require_row(&self) -> Result<usize> {
        self.row_ord.ok_or_else(|| Error::key_not_found(&"<cursor has no row position>"))
    }

    fn require_col(&self) -> Result<usize> {
        self.col_ord.ok_or_else(|| Error::key_not_found(&"<cursor has no column position>"))
    }

    /// Moves to `key`'s current row ordinal, leaving the column position
    /// untouched.
    pub fn at_row_key<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, key: &R) -> Result<&mut Self> {
        self.row_ord = Some(frame.row_index().get_ordinal_for_key(key)?);
        Ok(self)
    }

    /// Moves to row ordinal `ord` directly, leaving the column position
    /// untouched.
    pub fn at_row_ordinal<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, ord: usize) -> Result<&mut Self> {
        frame.row_index().canonical_at(ord)?;
        self.row_ord = Some(ord);
        Ok(self)
    }

    /// Moves to `key`'s current column ordinal, leaving the row position
    /// untouched.
    pub fn at_col_key<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, key: &C) -> Result<&mut Self> {
        self.col_ord = Some(frame.col_index().get_ordinal_for_key(key)?);
        Ok(self)
    }

    /// Moves to column ordinal `ord` directly, leaving the row position
    /// untouched.
    pub fn at_col_ordinal<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, ord: usize) -> Result<&mut Self> {
        frame.col_index().canonical_at(ord)?;
        self.col_ord = Some(ord);
        Ok(self)
    }

    /// Moves both dimensions by key in one call.
    pub fn at_keys<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, row: &R, col: &C) -> Result<&mut Self> {
        self.at_row_key(frame, row)?;
        self.at_col_key(frame, col)?;
        Ok(self)
    }

    /// Moves both dimensions by ordinal in one call.
    pub fn at_ordinals<R: Key, C: Key>(&mut self, frame: &Frame<R, C>, row_ord: usize, col_ord: usize) -> Result<&mut Self> {
        self.at_row_ordinal(frame, row_ord)?;
        self.at_col_ordinal(frame, col_ord)?;
        Ok(self)
    }

    /// Moves the row position to the first live row whose key is `>= value`
    /// under `R`'s natural order, leaving the column position untouched.
    /// Fails if every live row sorts before `value`.
    pub fn move_to<R: Key + Ord, C: Key>(&mut self, frame: &Frame<R, C>, value: &R) -> Result<&mut Self> {
        let keys = frame.row_index().keys();
        let ord = crate::array::sort::lower_bound(&keys, value, &|a, b| a.cmp(b));
        if ord >= keys.len() {
            return Err(Error::key_not_found(value));
        }
        self.row_ord = Some(ord);
        Ok(self)
    }

    /// Reads the current position as a boxed [`Scalar`].
    pub fn get_value<R: Key, C: Key>(&self, frame: &Frame<R, C>) -> Result<Scalar> {
        frame.get_value_at(self.require_row()?, self.require_col()?)
    }

    /// Reads the current position as a `bool`.
    pub fn get_bool<R: Key, C: Key>(&self, frame: &Frame<R, C>) -> Result<bool> {
        frame.get_bool_at(self.require_row()?, self.require_col()?)
    }

    /// Reads the current position as an `i32`.
    pub fn get_i32<R: Key, C: Key>(&self, frame: &Frame<R, C>) -> Result<i32> {
        frame.get_i32_at(self.require_row()?, self.require_col()?)
    }

    /// Reads the current position as an `i64`.
    pub fn get_i64<R: Key, C: Key>(&self, frame: &Frame<R, C>) -> Result<i64> {
        frame.get_i64_at(self.require_row()?, self.require_col()?)
    }

    /// Reads the current position as an `f64`.
    pub fn get_f64<R: Key, C: Key>(&self, frame: &Frame<R, C>) -> Result<f64> {
        frame.get_f64_at(self.require_row()?, self.require_col()?)
    }

    /// Writes `value` at the current position, returning the previous
    /// value.
    pub fn set_value<R: Key, C: Key>(&self, frame: &mut Frame<R, C>, value: &Scalar) -> Result<Scalar> {
        frame.set_value_at(self.require_row()?, self.require_col()?, value)
    }

    /// Writes a `bool` at the current position, returning the previous
    /// value.
    pub fn set_bool<R: Key, C: Key>(&self, frame: &mut Frame<R, C>, value: bool) -> Result<bool> {
        frame.set_bool_at(self.require_row()?, self.require_col()?, value)
    }

    /// Writes an `i32` at the current position, returning the previous
    /// value.
    pub fn set_i32<R: Key, C: Key>(&self, frame: &mut Frame<R, C>, value: i32) -> Result<i32> {
        frame.set_i32_at(self.require_row()?, self.require_col()?, value)
    }

    /// Writes an `i64` at the current position, returning the previous
    /// value.
    pub fn set_i64<R: Key, C: Key>(&self, frame: &mut Frame<R, C>, value: i64) -> Result<i64> {
        frame.set_i64_at(self.require_row()?, self.require_col()?, value)
    }

    /// Writes an `f64` at the current position, returning the previous
    /// value.
    pub fn set_f64<R: Key, C: Key>(&self, frame: &mut Frame<R, C>, value: f64) -> Result<f64> {
        frame.set_f64_at(self.require_row()?, self.require_col()?, value)
    }
}

/// A read-only, length-`n` slice over one row of a frame (fixed row
/// varying across columns) or one column (fixed column varying across
/// rows).
///
/// Unlike [`Cursor`], `Vector` is read-only and borrows its frame for its
/// whole lifetime -- the same shallow-view shape as
/// [`Frame::rows`](crate::frame::Frame::rows)/[`Frame::cols`](crate::frame::Frame::cols),
/// which already hand out values (not references) and so need no special
/// aliasing care.
#[derive(Debug, Clone)]
pub struct Vector<'a, R: Key, C: Key> {
    frame: &'a Frame<R, C>,
    lane: Lane<R, C>,
}

/// Which dimension a [`Vector`] holds fixed: a single row key varying
/// across columns, or a single column key varying across rows.
#[derive(Debug, Clone)]
enum Lane<R: Key, C: Key> {
    Row(R),
    Column(C),
}

impl<'a, R: Key, C: Key> Vector<'a, R, C> {
    /// A vector over row `key`, varying across every live column.
    pub fn over_row(frame: &'a Frame<R, C>, key: R) -> Result<Self> {
        frame.row_index().get_index_for_key(&key)?;
        Ok(Self { frame, lane: Lane::Row(key) })
    }

    /// A vector over column `key`, varying across every live row.
    pub fn over_column(frame: &'a Frame<R, C>, key: C) -> Result<Self> {
        frame.col_index().get_index_for_key(&key)?;
        Ok(Self { frame, lane: Lane::Column(key) })
    }

    /// The vector's length: the frame's column count for a row vector, its
    /// row count for a column vector.
    pub fn size(&self) -> usize {
        match &self.lane {
            Lane::Row(_) => self.frame.col_count(),
            Lane::Column(_) => self.frame.row_count(),
        }
    }

    /// Resolves ordinal `i` (`0..self.size()`) to the `(row_ord, col_ord)`
    /// pair it addresses in the underlying frame.
    fn ordinal_pair(&self, i: usize) -> Result<(usize, usize)> {
        match &self.lane {
            Lane::Row(key) => {
                let row_ord = self.frame.row_index().get_ordinal_for_key(key)?;
                Ok((row_ord, i))
            }
            Lane::Column(key) => {
                let col_ord = self.frame.col_index().get_ordinal_for_key(key)?;
                Ok((i, col_ord))
            }
        }
    }

    /// Reads ordinal `i` of the vector as a boxed [`Scalar`].
    pub fn get_value(&self, i: usize) -> Result<Scalar> {
        let (row_ord, col_ord) = self.ordinal_pair(i)?;
        self.frame.get_value_at(row_ord, col_ord)
    }

    /// Reads ordinal `i` widened to `f64`; fails with
    /// [`Error::NonNumeric`] if that cell's column isn't numeric.
    pub fn get_f64(&self, i: usize) -> Result<f64> {
        let (row_ord, col_ord) = self.ordinal_pair(i)?;
        let row_c = self.frame.row_index().canonical_at(row_ord)?;
        let col_c = self.frame.col_index().canonical_at(col_ord)?;
        self.frame.data()[col_c]
            .numeric_at(row_c)
            .ok_or_else(|| Error::NonNumeric {
                column: format!("vector element {i}"),
            })
    }

    /// A lazy stream of every element, in ordinal order, as boxed
    /// [`Scalar`]s.
    pub fn stream(&self) -> impl Iterator<Item = Result<Scalar>> + '_ {
        (0..self.size()).map(move |i| self.get_value(i))
    }

    /// Every element widened to `f64`, in ordinal order. Fails with
    /// [`Error::NonNumeric`] on the first non-numeric cell.
    pub fn numeric_values(&self) -> Result<Vec<f64>> {
        (0..self.size()).map(|i| self.get_f64(i)).collect()
    }

    /// Streaming statistics over the vector's numeric values.
    pub fn stats(&self) -> Result<Stats> {
        Ok(Stats::new(self.numeric_values()?.into_iter()))
    }

    /// First-seen distinct values, in encounter order.
    pub fn distinct(&self) -> Result<Vec<Scalar>> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for i in 0..self.size() {
            let value = self.get_value(i)?;
            let rendering = format!("{value:?}");
            if !seen.contains(&rendering) {
                seen.push(rendering);
                out.push(value);
            }
        }
        Ok(out)
    }

    /// Fractional rank of every element under the ambient
    /// [`crate::config::Config`] NaN/tie strategy.
    pub fn rank(&self) -> Result<Vec<f64>> {
        match &self.lane {
            Lane::Column(col) => self.frame.rank(col),
            Lane::Row(_) => {
                let values = self.numeric_values()?;
                let cfg = crate::config::Config::current();
                Ok(crate::frame::rank_values(&values, cfg.nan_strategy, cfg.tie_strategy))
            }
        }
    }

    /// Binary-searches the vector's numeric values for `target`, assuming
    /// ascending order.
    pub fn binary_search(&self, target: f64) -> Result<isize> {
        let values = self.numeric_values()?;
        let result = crate::array::sort::binary_search(&values, &target, &f64::total_cmp);
        Ok(crate::array::sort::encode_search_result(result))
    }

    /// Materializes this vector into a standalone one-row (for a row
    /// vector) or one-column (for a column vector) [`Frame`].
    pub fn to_data_frame(&self) -> Result<Frame<R, C>> {
        match &self.lane {
            Lane::Row(row_key) => {
                let col_keys = self.frame.cols().keys();
                let mut columns = Vec::with_capacity(col_keys.len());
                for col_key in &col_keys {
                    let col_c = self.frame.col_index().get_index_for_key(col_key)?;
                    let type_code = self.frame.data()[col_c].type_code();
                    columns.push((col_key.clone(), crate::frame::make_column(type_code, 1)));
                }
                let mut out = Frame::from_builder([row_key.clone()], columns)?;
                for (i, col_key) in col_keys.iter().enumerate() {
                    let value = self.get_value(i)?;
                    out.set_value(row_key, col_key, &value)?;
                }
                Ok(out)
            }
            Lane::Column(col_key) => {
                let row_keys = self.frame.rows().keys();
                let col_c = self.frame.col_index().get_index_for_key(col_key)?;
                let type_code = self.frame.data()[col_c].type_code();
                let columns = vec![(col_key.clone(), crate::frame::make_column(type_code, row_keys.len()))];
                let mut out = Frame::from_builder(row_keys.clone(), columns)?;
                for (i, row_key) in row_keys.iter().enumerate() {
                    let value = self.get_value(i)?;
                    out.set_value(row_key, col_key, &value)?;
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeCode;

    fn sample_frame() -> Frame<&'static str, &'static str> {
        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2"], ["c0", "c1"], TypeCode::Float64).unwrap();
        for (row, c0, c1) in [("r0", 1.0, 10.0), ("r1", 2.0, 20.0), ("r2", 3.0, 30.0)] {
            frame.set_f64(&row, &"c0", c0).unwrap();
            frame.set_f64(&row, &"c1", c1).unwrap();
        }
        frame
    }

    #[test]
    fn cursor_moves_by_key_and_reads_the_right_cell() {
        let frame = sample_frame();
        let mut cursor = Cursor::new();
        cursor.at_keys(&frame, &"r1", &"c1").unwrap();
        assert_eq!(cursor.get_f64(&frame).unwrap(), 20.0);
    }

    #[test]
    fn cursor_moves_by_ordinal_independently_per_dimension() {
        let frame = sample_frame();
        let mut cursor = Cursor::new();
        cursor.at_row_ordinal(&frame, 2).unwrap();
        cursor.at_col_ordinal(&frame, 0).unwrap();
        assert_eq!(cursor.get_f64(&frame).unwrap(), 3.0);
    }

    #[test]
    fn cursor_write_routes_through_frame_and_is_observed_by_key_read() {
        let mut frame = sample_frame();
        let mut cursor = Cursor::new();
        cursor.at_keys(&frame, &"r0", &"c0").unwrap();
        cursor.set_f64(&mut frame, 99.0).unwrap();
        assert_eq!(frame.get_f64(&"r0", &"c0").unwrap(), 99.0);
    }

    #[test]
    fn cursor_with_no_position_fails_on_read() {
        let frame = sample_frame();
        let cursor = Cursor::new();
        assert!(cursor.get_f64(&frame).is_err());
    }

    #[test]
    fn move_to_finds_lower_bound_row() {
        let frame = sample_frame();
        let mut cursor = Cursor::new();
        cursor.move_to(&frame, &"r1").unwrap();
        assert_eq!(cursor.row_ordinal(), Some(1));
    }

    #[test]
    fn column_vector_stats_and_distinct() {
        let frame = sample_frame();
        let vector = Vector::over_column(&frame, "c0").unwrap();
        assert_eq!(vector.size(), 3);
        assert_eq!(vector.numeric_values().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(vector.stats().unwrap().mean(), 2.0);
        assert_eq!(vector.distinct().unwrap().len(), 3);
    }

    #[test]
    fn row_vector_reads_across_columns() {
        let frame = sample_frame();
        let vector = Vector::over_row(&frame, "r1").unwrap();
        assert_eq!(vector.size(), 2);
        assert_eq!(vector.numeric_values().unwrap(), vec![2.0, 20.0]);
    }

    #[test]
    fn column_vector_binary_search_matches_convention() {
        let frame = sample_frame();
        let vector = Vector::over_column(&frame, "c0").unwrap();
        assert_eq!(vector.binary_search(2.0).unwrap(), 1);
        assert_eq!(vector.binary_search(100.0).unwrap(), -4);
    }
}
