//! The [`ArrayElement`] and [`FixedWidth`] traits that parameterize
//! [`TypedArray`](super::TypedArray) over a concrete Rust representation per
//! `TypeCode`.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{Scalar, TypeCode};

/// A concrete Rust type that can back a `TypedArray` column.
///
/// Implemented for every native representation a `TypeCode` can back.
/// `default_sentinel` is the value a slot holds before it is ever written
/// and what a sparse array reports for an absent index.
pub trait ArrayElement: Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static {
    /// The `TypeCode` this representation backs.
    const TYPE_CODE: TypeCode;

    /// The natural null/default value for this type.
    fn default_sentinel() -> Self;

    /// Total order used by `sort`/`binary_search`/`previous`/`next`.
    ///
    /// Must be a genuine total order (in particular, consistent and
    /// transitive) for `binary_search` to behave; `f64::total_cmp`-style
    /// orderings (NaN sorts last) are expected for floating point.
    fn total_order(a: &Self, b: &Self) -> Ordering;

    /// Whether `self` is this type's null sentinel.
    ///
    /// The default compares against [`ArrayElement::default_sentinel`];
    /// `FLOAT64` overrides this since `NaN == NaN` is `false` under
    /// `PartialEq`.
    fn is_null_value(&self) -> bool {
        *self == Self::default_sentinel()
    }
}

impl ArrayElement for bool {
    const TYPE_CODE: TypeCode = TypeCode::Bool;
    fn default_sentinel() -> Self {
        false
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for i32 {
    const TYPE_CODE: TypeCode = TypeCode::Int32;
    fn default_sentinel() -> Self {
        0
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for i64 {
    const TYPE_CODE: TypeCode = TypeCode::Int64;
    fn default_sentinel() -> Self {
        0
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for f64 {
    const TYPE_CODE: TypeCode = TypeCode::Float64;
    fn default_sentinel() -> Self {
        f64::NAN
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        // NaN sorts last under ascending order.
        a.total_cmp(b)
    }
    fn is_null_value(&self) -> bool {
        self.is_nan()
    }
}

impl ArrayElement for Box<str> {
    const TYPE_CODE: TypeCode = TypeCode::Str;
    fn default_sentinel() -> Self {
        "".into()
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for Decimal {
    const TYPE_CODE: TypeCode = TypeCode::Currency;
    fn default_sentinel() -> Self {
        Decimal::ZERO
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for NaiveDate {
    const TYPE_CODE: TypeCode = TypeCode::Date;
    fn default_sentinel() -> Self {
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date")
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for NaiveDateTime {
    const TYPE_CODE: TypeCode = TypeCode::DateTimeLocal;
    fn default_sentinel() -> Self {
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .expect("valid epoch date")
            .and_hms_opt(0, 0, 0)
            .expect("valid epoch time")
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl ArrayElement for NaiveTime {
    const TYPE_CODE: TypeCode = TypeCode::TimeLocal;
    fn default_sentinel() -> Self {
        NaiveTime::from_hms_opt(0, 0, 0).expect("valid midnight")
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

/// A calendar year, kept distinct from a plain `i32` so it carries its own
/// `TypeCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(pub i32);

impl ArrayElement for Year {
    const TYPE_CODE: TypeCode = TypeCode::Year;
    fn default_sentinel() -> Self {
        Year(0)
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.0.cmp(&b.0)
    }
}

/// An epoch-millis instant, kept distinct from a plain `i64` so it carries
/// its own `TypeCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(pub i64);

impl ArrayElement for Instant {
    const TYPE_CODE: TypeCode = TypeCode::Instant;
    fn default_sentinel() -> Self {
        Instant(0)
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.0.cmp(&b.0)
    }
}

/// An index into a per-array symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumCode(pub u32);

impl ArrayElement for EnumCode {
    const TYPE_CODE: TypeCode = TypeCode::Enum;
    fn default_sentinel() -> Self {
        EnumCode(0)
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.0.cmp(&b.0)
    }
}

/// A zoned instant: an epoch-millis timestamp plus a zone id indexing into a
/// header-embedded zone dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedDateTime(pub chrono::DateTime<chrono::Utc>, pub i16);

impl ArrayElement for ZonedDateTime {
    const TYPE_CODE: TypeCode = TypeCode::DateTimeZoned;
    fn default_sentinel() -> Self {
        ZonedDateTime(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH, 0)
    }
    fn total_order(a: &Self, b: &Self) -> Ordering {
        a.0.cmp(&b.0).then(a.1.cmp(&b.1))
    }
}

/// An opaque, boxed cell for the `OBJECT` escape hatch.
#[derive(Debug, Clone, Default)]
pub struct ObjectCell(pub crate::types::ObjectValue);

impl PartialEq for ObjectCell {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ArrayElement for ObjectCell {
    const TYPE_CODE: TypeCode = TypeCode::Object;
    fn default_sentinel() -> Self {
        ObjectCell(None)
    }
    fn total_order(_a: &Self, _b: &Self) -> Ordering {
        Ordering::Equal
    }
}

/// A fixed-width binary encoding used by the memory-mapped backend.
///
/// Never implemented for `STRING`/`OBJECT`, which are variable-width and so
/// can't back a mapped column.
pub trait FixedWidth: Sized {
    /// The encoded width, in bytes.
    const WIDTH: usize;

    /// Serializes `self` into `buf[..Self::WIDTH]`, big-endian.
    fn write_be(&self, buf: &mut [u8]);

    /// Deserializes a value from `buf[..Self::WIDTH]`, big-endian.
    fn read_be(buf: &[u8]) -> Self;
}

impl FixedWidth for bool {
    const WIDTH: usize = 1;
    fn write_be(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }
    fn read_be(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

impl FixedWidth for i32 {
    const WIDTH: usize = 4;
    fn write_be(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.to_be_bytes());
    }
    fn read_be(buf: &[u8]) -> Self {
        i32::from_be_bytes(buf[..4].try_into().expect("4 bytes"))
    }
}

impl FixedWidth for i64 {
    const WIDTH: usize = 8;
    fn write_be(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_be_bytes());
    }
    fn read_be(buf: &[u8]) -> Self {
        i64::from_be_bytes(buf[..8].try_into().expect("8 bytes"))
    }
}

impl FixedWidth for f64 {
    const WIDTH: usize = 8;
    fn write_be(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_bits().to_be_bytes());
    }
    fn read_be(buf: &[u8]) -> Self {
        f64::from_bits(u64::from_be_bytes(buf[..8].try_into().expect("8 bytes")))
    }
}

impl FixedWidth for NaiveDate {
    // Days since the Common Era epoch, as `i32`.
    const WIDTH: usize = 4;
    fn write_be(&self, buf: &mut [u8]) {
        self.num_days_from_ce().write_be(buf);
    }
    fn read_be(buf: &[u8]) -> Self {
        NaiveDate::from_num_days_from_ce_opt(i32::read_be(buf)).unwrap_or_else(Self::default_sentinel)
    }
}

impl FixedWidth for Year {
    const WIDTH: usize = 4;
    fn write_be(&self, buf: &mut [u8]) {
        self.0.write_be(buf);
    }
    fn read_be(buf: &[u8]) -> Self {
        Year(i32::read_be(buf))
    }
}

impl FixedWidth for Instant {
    const WIDTH: usize = 8;
    fn write_be(&self, buf: &mut [u8]) {
        self.0.write_be(buf);
    }
    fn read_be(buf: &[u8]) -> Self {
        Instant(i64::read_be(buf))
    }
}

impl FixedWidth for EnumCode {
    const WIDTH: usize = 4;
    fn write_be(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.0.to_be_bytes());
    }
    fn read_be(buf: &[u8]) -> Self {
        EnumCode(u32::from_be_bytes(buf[..4].try_into().expect("4 bytes")))
    }
}

impl FixedWidth for ZonedDateTime {
    // epoch-millis: i64 (8 bytes) | zone id: i16 (2 bytes).
    const WIDTH: usize = 10;
    fn write_be(&self, buf: &mut [u8]) {
        self.0.timestamp_millis().write_be(&mut buf[..8]);
        buf[8..10].copy_from_slice(&self.1.to_be_bytes());
    }
    fn read_be(buf: &[u8]) -> Self {
        let millis = i64::read_be(&buf[..8]);
        let zone = i16::from_be_bytes(buf[8..10].try_into().expect("2 bytes"));
        let dt = chrono::DateTime::from_timestamp_millis(millis).unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        ZonedDateTime(dt, zone)
    }
}

impl FixedWidth for NaiveDateTime {
    // Milliseconds since the Unix epoch, as `i64`.
    const WIDTH: usize = 8;
    fn write_be(&self, buf: &mut [u8]) {
        self.and_utc().timestamp_millis().write_be(buf);
    }
    fn read_be(buf: &[u8]) -> Self {
        let millis = i64::read_be(buf);
        chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .unwrap_or_else(Self::default_sentinel)
    }
}

impl FixedWidth for NaiveTime {
    // Nanoseconds since midnight, as `i64`.
    const WIDTH: usize = 8;
    fn write_be(&self, buf: &mut [u8]) {
        let nanos = i64::from(self.num_seconds_from_midnight()) * 1_000_000_000
            + i64::from(self.nanosecond());
        nanos.write_be(buf);
    }
    fn read_be(buf: &[u8]) -> Self {
        let nanos = i64::read_be(buf);
        let secs = (nanos / 1_000_000_000) as u32;
        let subsec = (nanos % 1_000_000_000) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, subsec)
            .unwrap_or_else(Self::default_sentinel)
    }
}

/// Exposes the four unboxed primitive accessors
/// uniformly over every
/// `ArrayElement`, without requiring `dyn Any` downcasts at the call site.
///
/// Every method defaults to `None`; a concrete element type overrides only
/// the accessor matching its own representation. This is what lets
/// [`super::AnyArray`] implement `get_bool`/`get_i32`/`get_i64`/`get_f64`
/// once, generically, for every `TypedArray<T>`, returning
/// [`Error::TypeMismatch`] whenever `T` doesn't match the requested
/// accessor.
pub trait PrimitiveAccess: Sized {
    fn as_bool(&self) -> Option<bool> {
        None
    }
    fn as_i32(&self) -> Option<i32> {
        None
    }
    fn as_i64(&self) -> Option<i64> {
        None
    }
    fn as_f64(&self) -> Option<f64> {
        None
    }
    fn from_bool(_value: bool) -> Option<Self> {
        None
    }
    fn from_i32(_value: i32) -> Option<Self> {
        None
    }
    fn from_i64(_value: i64) -> Option<Self> {
        None
    }
    fn from_f64(_value: f64) -> Option<Self> {
        None
    }
    /// Lossy widening to `f64`, used by [`super::AnyArray::numeric_at`] to
    /// expose every `TypeCode` `TypeCode::is_numeric` reports as true
    /// uniformly, regardless of its native width. Unlike `as_f64`, which
    /// only matches an exact `FLOAT64` column, this widens `INT32`/`INT64`/
    /// `YEAR`/`INSTANT`/`CURRENCY` too.
    fn as_numeric(&self) -> Option<f64> {
        None
    }
}

impl PrimitiveAccess for bool {
    fn as_bool(&self) -> Option<bool> {
        Some(*self)
    }
    fn from_bool(value: bool) -> Option<Self> {
        Some(value)
    }
}

impl PrimitiveAccess for i32 {
    fn as_i32(&self) -> Option<i32> {
        Some(*self)
    }
    fn from_i32(value: i32) -> Option<Self> {
        Some(value)
    }
    fn as_numeric(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl PrimitiveAccess for i64 {
    fn as_i64(&self) -> Option<i64> {
        Some(*self)
    }
    fn from_i64(value: i64) -> Option<Self> {
        Some(value)
    }
    fn as_numeric(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl PrimitiveAccess for f64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }
    fn from_f64(value: f64) -> Option<Self> {
        Some(value)
    }
    fn as_numeric(&self) -> Option<f64> {
        Some(*self)
    }
}

impl PrimitiveAccess for Box<str> {}
impl PrimitiveAccess for Decimal {
    fn as_numeric(&self) -> Option<f64> {
        self.to_f64()
    }
}
impl PrimitiveAccess for NaiveDate {}
impl PrimitiveAccess for NaiveDateTime {}
impl PrimitiveAccess for NaiveTime {}

impl PrimitiveAccess for Year {
    fn as_i32(&self) -> Option<i32> {
        Some(self.0)
    }
    fn from_i32(value: i32) -> Option<Self> {
        Some(Year(value))
    }
    fn as_numeric(&self) -> Option<f64> {
        Some(f64::from(self.0))
    }
}

impl PrimitiveAccess for Instant {
    fn as_i64(&self) -> Option<i64> {
        Some(self.0)
    }
    fn from_i64(value: i64) -> Option<Self> {
        Some(Instant(value))
    }
    fn as_numeric(&self) -> Option<f64> {
        Some(self.0 as f64)
    }
}

impl PrimitiveAccess for EnumCode {}
impl PrimitiveAccess for ZonedDateTime {}
impl PrimitiveAccess for ObjectCell {}

/// Converts between a concrete element type and the boxed [`Scalar`] used at
/// the polymorphic `getValue`/`setValue` boundary.
pub trait ScalarConvert: ArrayElement {
    /// Boxes `self` as a `Scalar`.
    fn to_scalar(&self) -> Scalar;
    /// Unboxes a `Scalar`, failing with [`Error::TypeMismatch`] if its tag
    /// doesn't match `Self::TYPE_CODE`.
    fn from_scalar(scalar: &Scalar) -> Result<Self>;
}

macro_rules! scalar_convert {
    ($ty:ty, $variant:ident) => {
        impl ScalarConvert for $ty {
            fn to_scalar(&self) -> Scalar {
                Scalar::$variant(self.clone())
            }
            fn from_scalar(scalar: &Scalar) -> Result<Self> {
                match scalar {
                    Scalar::$variant(value) => Ok(value.clone()),
                    other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
                }
            }
        }
    };
}

scalar_convert!(bool, Bool);
scalar_convert!(i32, Int32);
scalar_convert!(i64, Int64);
scalar_convert!(f64, Float64);
scalar_convert!(Box<str>, Str);
scalar_convert!(Decimal, Currency);
scalar_convert!(NaiveDate, Date);
scalar_convert!(NaiveDateTime, DateTimeLocal);
scalar_convert!(NaiveTime, TimeLocal);

impl ScalarConvert for Year {
    fn to_scalar(&self) -> Scalar {
        Scalar::Year(self.0)
    }
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Year(value) => Ok(Year(*value)),
            other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
        }
    }
}

impl ScalarConvert for Instant {
    fn to_scalar(&self) -> Scalar {
        Scalar::Instant(self.0)
    }
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Instant(value) => Ok(Instant(*value)),
            other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
        }
    }
}

impl ScalarConvert for EnumCode {
    fn to_scalar(&self) -> Scalar {
        Scalar::Enum(self.0)
    }
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Enum(value) => Ok(EnumCode(*value)),
            other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
        }
    }
}

impl ScalarConvert for ZonedDateTime {
    fn to_scalar(&self) -> Scalar {
        Scalar::DateTimeZoned(self.0, self.1)
    }
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::DateTimeZoned(dt, zone) => Ok(ZonedDateTime(*dt, *zone)),
            other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
        }
    }
}

impl ScalarConvert for ObjectCell {
    fn to_scalar(&self) -> Scalar {
        Scalar::Object(self.0.clone())
    }
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Object(value) => Ok(ObjectCell(value.clone())),
            other => Err(Error::type_mismatch(Self::TYPE_CODE.name(), other.type_code().name())),
        }
    }
}

