//! `TypeCode`, the tag identifying a column's storage specialization, and
//! [`Scalar`], the boxed value type used at the polymorphic access boundary.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

/// Opaque handle for an `OBJECT`-typed cell.
///
/// `OBJECT` is the escape hatch for values the engine itself has no native
/// representation for; it is always stored densely.
pub type ObjectValue = Option<Arc<dyn std::any::Any + Send + Sync>>;

/// The tag identifying a column's storage specialization.
///
/// Each `TypeCode` fixes a natural null sentinel, a total order and a
/// default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// `bool`, null sentinel `false`.
    Bool,
    /// `i32`, null sentinel `0`.
    Int32,
    /// `i64`, null sentinel `0`.
    Int64,
    /// `f64`, null sentinel `NaN`.
    Float64,
    /// `Box<str>`, null sentinel `""`.
    Str,
    /// `u32` index into a per-array symbol table, null sentinel `0`.
    Enum,
    /// `chrono::NaiveDate`, null sentinel the Unix epoch date.
    Date,
    /// `chrono::NaiveDateTime`, null sentinel the Unix epoch.
    DateTimeLocal,
    /// `chrono::DateTime<Utc>` plus a zone id, null sentinel the Unix epoch
    /// in UTC.
    DateTimeZoned,
    /// `chrono::NaiveTime`, null sentinel midnight.
    TimeLocal,
    /// `rust_decimal::Decimal`, null sentinel `Decimal::ZERO`.
    Currency,
    /// `i32` calendar year, null sentinel `0`.
    Year,
    /// `i64` epoch-millis instant, null sentinel `0`.
    Instant,
    /// Opaque boxed value, null sentinel `None`.
    Object,
}

impl TypeCode {
    /// Human-readable name, used in [`crate::error::Error::TypeMismatch`]
    /// messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float64 => "FLOAT64",
            Self::Str => "STRING",
            Self::Enum => "ENUM",
            Self::Date => "DATE",
            Self::DateTimeLocal => "DATETIME-LOCAL",
            Self::DateTimeZoned => "DATETIME-ZONED",
            Self::TimeLocal => "TIME-LOCAL",
            Self::Currency => "CURRENCY",
            Self::Year => "YEAR",
            Self::Instant => "INSTANT",
            Self::Object => "OBJECT",
        }
    }

    /// Whether this `TypeCode` widens to `f64` for numeric operations
    /// (`Frame::numeric_column`, `describe`, `hist`, the statistics
    /// surface). `INT32`, `INT64`, `FLOAT64`, `CURRENCY`, `YEAR` and
    /// `INSTANT`; every other tag is non-numeric.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Float64 | Self::Currency | Self::Year | Self::Instant
        )
    }
}

impl std::fmt::Display for TypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A boxed, dynamically typed value used at the `getValue`/`setValue`
/// polymorphic access boundary.
///
/// Hot-path code should prefer the per-type accessors (`get_f64`,
/// `set_i32`, ...) over this enum; `Scalar` exists for callers that genuinely
/// need to move a value across a `TypeCode` boundary they don't know ahead
/// of time.
#[derive(Clone)]
pub enum Scalar {
    /// A `BOOL` cell.
    Bool(bool),
    /// An `INT32` cell.
    Int32(i32),
    /// An `INT64` cell.
    Int64(i64),
    /// A `FLOAT64` cell.
    Float64(f64),
    /// A `STRING` cell.
    Str(Box<str>),
    /// A `CURRENCY` cell.
    Currency(Decimal),
    /// A `DATE` cell.
    Date(NaiveDate),
    /// A `DATETIME-LOCAL` cell.
    DateTimeLocal(NaiveDateTime),
    /// A `TIME-LOCAL` cell.
    TimeLocal(NaiveTime),
    /// A `YEAR` cell, carrying the raw `i32` year.
    Year(i32),
    /// An `INSTANT` cell, carrying raw epoch-millis.
    Instant(i64),
    /// An `ENUM` cell, carrying the raw symbol-table index.
    Enum(u32),
    /// A `DATETIME-ZONED` cell: an instant plus a zone id.
    DateTimeZoned(DateTime<Utc>, i16),
    /// An `OBJECT` cell.
    Object(ObjectValue),
}

impl Scalar {
    /// The `TypeCode` this value is tagged with.
    pub fn type_code(&self) -> TypeCode {
        match self {
            Self::Bool(_) => TypeCode::Bool,
            Self::Int32(_) => TypeCode::Int32,
            Self::Int64(_) => TypeCode::Int64,
            Self::Float64(_) => TypeCode::Float64,
            Self::Str(_) => TypeCode::Str,
            Self::Currency(_) => TypeCode::Currency,
            Self::Date(_) => TypeCode::Date,
            Self::DateTimeLocal(_) => TypeCode::DateTimeLocal,
            Self::TimeLocal(_) => TypeCode::TimeLocal,
            Self::Year(_) => TypeCode::Year,
            Self::Instant(_) => TypeCode::Instant,
            Self::Enum(_) => TypeCode::Enum,
            Self::DateTimeZoned(..) => TypeCode::DateTimeZoned,
            Self::Object(_) => TypeCode::Object,
        }
    }
}

impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v:?})"),
            Self::Int32(v) => write!(f, "Int32({v:?})"),
            Self::Int64(v) => write!(f, "Int64({v:?})"),
            Self::Float64(v) => write!(f, "Float64({v:?})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::Currency(v) => write!(f, "Currency({v:?})"),
            Self::Date(v) => write!(f, "Date({v:?})"),
            Self::DateTimeLocal(v) => write!(f, "DateTimeLocal({v:?})"),
            Self::TimeLocal(v) => write!(f, "TimeLocal({v:?})"),
            Self::Year(v) => write!(f, "Year({v:?})"),
            Self::Instant(v) => write!(f, "Instant({v:?})"),
            Self::Enum(v) => write!(f, "Enum({v:?})"),
            Self::DateTimeZoned(dt, zone) => write!(f, "DateTimeZoned({dt:?}, {zone:?})"),
            Self::Object(v) => write!(f, "Object({})", if v.is_some() { "Some(..)" } else { "None" }),
        }
    }
}

/// Total order over `f64` with `NaN` sorting last, used wherever the engine
/// needs a genuine total order over floats (sorting, binary search) rather
/// than relying on `f64`'s partial order.
pub fn total_cmp_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
