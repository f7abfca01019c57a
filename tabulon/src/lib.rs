//! An in-memory columnar table engine: typed array storage with
//! dense/sparse/mapped backends, a dual ordinal↔canonical index, and a
//! [`Frame`](frame::Frame) assembly coordinating row/column axes, cursors
//! and a parallel execution façade.
//!
//! # Layout
//!
//! - [`types`] — [`TypeCode`](types::TypeCode), the tag identifying a
//!   column's storage specialization, and [`Scalar`](types::Scalar), the
//!   boxed value used at the polymorphic access boundary.
//! - [`array`] — [`TypedArray`](array::TypedArray), the per-type
//!   specialized, three-backend storage primitive.
//! - [`range`] — [`Range`](range::Range), a lazy, splittable, optionally
//!   filtered/mapped sequence generator.
//! - [`index`] — [`Index`](index::Index), the key↔canonical-index bijection
//!   plus its independent ordinal permutation.
//! - [`axis`] — [`Axis`](axis::Axis), a typed view over one dimension's
//!   index.
//! - [`frame`] — [`Frame`](frame::Frame), the columnar table assembled from
//!   a row axis, a column axis and per-column storage.
//! - [`cursor`] — [`Cursor`](cursor::Cursor) and [`Vector`](cursor::Vector),
//!   movable O(1) accessors into a frame.
//! - [`parallel`] — the fork/join split-threshold façade used by `Frame`
//!   and `Axis` statistics.
//! - [`events`] — per-frame structural/data change notification.
//! - [`config`] — explicit, scoped configuration (NaN/tie/duplicate
//!   policies, split thresholds) replacing thread-local configuration
//!   stacks.
//! - [`io`] — serialization for fixed-width typed arrays and the
//!   memory-mapped backend's persisted header layout.
//! - [`error`] — the engine's error taxonomy.
//!
//! Explicitly out of scope (external collaborators only): CSV/JSON/SQL
//! source and sink adapters, linear-algebra decompositions, text formatters
//! and CLI printing. [`io::Source`]/[`io::Sink`] are the hooks such adapters
//! implement against.

#![warn(missing_debug_implementations, missing_docs)]

pub mod array;
pub mod axis;
pub mod config;
pub mod cursor;
pub mod error;
pub mod events;
pub mod frame;
pub mod index;
pub mod io;
pub mod parallel;
pub mod range;
pub mod types;

pub use array::TypedArray;
pub use axis::Axis;
pub use config::Config;
pub use cursor::{Cursor, Vector};
pub use error::{Error, Result};
pub use frame::Frame;
pub use index::Index;
pub use range::Range;
pub use types::{Scalar, TypeCode};
