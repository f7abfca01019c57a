//! The error taxonomy for the engine.
//!
//! All failures are non-retryable and local to the call that raised them: a
//! failing write never leaves a [`TypedArray`](crate::array::TypedArray),
//! [`Index`](crate::index::Index) or [`Frame`](crate::frame::Frame) partially
//! mutated. Bounds and type checks always run before any storage is touched.

use thiserror::Error;

/// A specialized `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type produced by core engine operations.
///
/// Variant names track the kind of failure rather than the concrete Rust
/// type that raised it, so callers can match on the *kind* of problem (a
/// missing key vs. a type confusion) without caring which component
/// detected it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// An axis/index lookup was performed with a key that isn't present.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Debug rendering of the missing key.
        key: String,
    },

    /// An insert was attempted with a key that already exists while the
    /// enclosing call chain has opted out of ignoring duplicates.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// Debug rendering of the duplicate key.
        key: String,
    },

    /// An ordinal or canonical index fell outside `[0, length)`.
    #[error("index {index} out of bounds for length {length}")]
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The length it was checked against.
        length: usize,
    },

    /// A typed accessor was invoked against storage of another `TypeCode`.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The `TypeCode` the caller expected.
        expected: String,
        /// The `TypeCode` actually stored.
        found: String,
    },

    /// A write was attempted against read-only storage.
    #[error("write attempted on read-only {what}")]
    ReadOnly {
        /// What was read-only (e.g. `"array"`, `"index"`).
        what: String,
    },

    /// A binary operation was attempted on frames/arrays of incompatible
    /// shape.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Description of the left-hand shape.
        left: String,
        /// Description of the right-hand shape.
        right: String,
    },

    /// A numeric operation was attempted on a non-numeric column.
    #[error("non-numeric column: {column}")]
    NonNumeric {
        /// The offending column key, rendered as a string.
        column: String,
    },

    /// A linear-algebra routine (outside this crate's scope) reported a
    /// singular matrix. Kept here so external LA modules can report through
    /// the same taxonomy.
    #[error("singular matrix")]
    Singular,

    /// A source/sink adapter failed. Kept here so external I/O modules can
    /// report through the same taxonomy.
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Builds a [`Error::KeyNotFound`] from any `Debug` key.
    pub fn key_not_found<K: std::fmt::Debug>(key: &K) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    /// Builds a [`Error::DuplicateKey`] from any `Debug` key.
    pub fn duplicate_key<K: std::fmt::Debug>(key: &K) -> Self {
        Self::DuplicateKey {
            key: format!("{key:?}"),
        }
    }

    /// Builds a [`Error::OutOfBounds`].
    pub fn out_of_bounds(index: usize, length: usize) -> Self {
        Self::OutOfBounds { index, length }
    }

    /// Builds a [`Error::TypeMismatch`].
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Builds a [`Error::ReadOnly`].
    pub fn read_only(what: impl Into<String>) -> Self {
        Self::ReadOnly { what: what.into() }
    }

    /// Builds a [`Error::DimensionMismatch`].
    pub fn dimension_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
