//! Explicit, plumbed-through configuration.
//!
//! Earlier iterations of this kind of engine lean on a set of thread-local
//! configuration stacks (NaN ranking strategy, tie-breaking strategy,
//! duplicate-key policy, parallel split thresholds, decomposition-library
//! preference) that calling code pushes and pops around a call chain. That
//! pattern doesn't translate cleanly here: a pushed/popped thread-local is
//! invisible at the call site and easy to leave unbalanced across an early
//! return. Instead, [`Config`] is an explicit, `Copy` struct threaded through
//! [`Config::current`]/[`Config::scoped`] -- still a thread-local underneath,
//! but the scope is always visible as a guard value at the call site rather
//! than a push/pop pair.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

/// How `NaN` values sort relative to ordinary numbers during ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NanStrategy {
    /// `NaN` sorts below every ordinary number.
    Min,
    /// `NaN` sorts above every ordinary number.
    Max,
}

/// How tied values share a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieStrategy {
    /// Every member of a tied run takes the lowest rank in the run.
    Min,
    /// Every member of a tied run takes the highest rank in the run.
    Max,
    /// Every member of a tied run takes the mean rank across the run.
    Average,
}

/// Preferred backend for linear-algebra routines outside this crate's core
/// scope; this flag exists purely so a caller's preference can be plumbed
/// through to an external LA module without the core needing to know about
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionLib {
    /// A pure-Rust, dependency-free implementation.
    Native,
    /// A third-party numerical library.
    ThirdParty,
}

/// Duplicate-key policy for axis insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Re-inserting an existing key is a silent no-op (default).
    Ignore,
    /// Re-inserting an existing key fails with
    /// [`Error::DuplicateKey`](crate::error::Error::DuplicateKey).
    Reject,
}

/// Process-wide operation configuration.
///
/// `Config` is `Copy`, so it can be threaded through call chains cheaply, or
/// installed as the ambient default for a scope via [`Config::scoped`].
/// `Serialize`/`Deserialize` let a caller load one from a config file rather
/// than building it by hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// NaN-ranking policy. Defaults to [`NanStrategy::Max`].
    pub nan_strategy: NanStrategy,
    /// Tie-breaking policy. Defaults to [`TieStrategy::Average`].
    pub tie_strategy: TieStrategy,
    /// Axis insertion duplicate policy. Defaults to
    /// [`DuplicatePolicy::Ignore`].
    pub duplicate_policy: DuplicatePolicy,
    /// Preferred linear-algebra backend for external consumers. Defaults to
    /// [`DecompositionLib::Native`].
    pub decomposition_lib: DecompositionLib,
    /// Minimum row count per parallel task; below this an axis marked
    /// `parallel` still runs sequentially. `None` means "derive from
    /// `row_count / available_parallelism`" (see [`crate::parallel`]).
    pub row_split_threshold: Option<usize>,
    /// Minimum column count per parallel task, analogous to
    /// `row_split_threshold`.
    pub col_split_threshold: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nan_strategy: NanStrategy::Max,
            tie_strategy: TieStrategy::Average,
            duplicate_policy: DuplicatePolicy::Ignore,
            decomposition_lib: DecompositionLib::Native,
            row_split_threshold: None,
            col_split_threshold: None,
        }
    }
}

thread_local! {
    static CURRENT: Cell<Config> = Cell::new(Config::default());
}

/// A guard that restores the previous thread-local [`Config`] when dropped.
///
/// Obtained from [`Config::scoped`]; restoring on `Drop` means the previous
/// configuration comes back on every exit path from the scope, including an
/// early `return`, a `?`, or a panic unwinding through it.
pub struct ScopedConfig {
    previous: Config,
}

impl Drop for ScopedConfig {
    fn drop(&mut self) {
        CURRENT.with(|cell| cell.set(self.previous));
    }
}

impl Config {
    /// Returns the configuration currently installed for this thread.
    pub fn current() -> Self {
        CURRENT.with(Cell::get)
    }

    /// Installs `self` as the thread-local configuration and returns a guard
    /// that restores the previous configuration when dropped.
    ///
    /// ```
    /// use tabulon::config::{Config, DuplicatePolicy};
    ///
    /// let mut cfg = Config::default();
    /// cfg.duplicate_policy = DuplicatePolicy::Reject;
    /// let _guard = cfg.scoped();
    /// assert_eq!(Config::current().duplicate_policy, DuplicatePolicy::Reject);
    /// drop(_guard);
    /// assert_eq!(Config::current().duplicate_policy, DuplicatePolicy::Ignore);
    /// ```
    pub fn scoped(self) -> ScopedConfig {
        let previous = CURRENT.with(|cell| cell.replace(self));
        ScopedConfig { previous }
    }

    /// Runs `f` with `self` installed as the thread-local configuration,
    /// restoring the previous configuration afterwards (even if `f` panics).
    pub fn with<R>(self, f: impl FnOnce() -> R) -> R {
        let _guard = self.scoped();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_restores_previous_on_normal_exit() {
        assert_eq!(Config::current().nan_strategy, NanStrategy::Max);
        let mut cfg = Config::default();
        cfg.nan_strategy = NanStrategy::Min;
        cfg.with(|| {
            assert_eq!(Config::current().nan_strategy, NanStrategy::Min);
        });
        assert_eq!(Config::current().nan_strategy, NanStrategy::Max);
    }

    #[test]
    fn scoped_restores_previous_on_panic() {
        let mut cfg = Config::default();
        cfg.nan_strategy = NanStrategy::Min;
        let result = std::panic::catch_unwind(|| {
            cfg.with(|| {
                panic!("boom");
            });
        });
        assert!(result.is_err());
        assert_eq!(Config::current().nan_strategy, NanStrategy::Max);
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut outer = Config::default();
        outer.tie_strategy = TieStrategy::Min;
        let mut inner = Config::default();
        inner.tie_strategy = TieStrategy::Max;

        outer.with(|| {
            assert_eq!(Config::current().tie_strategy, TieStrategy::Min);
            inner.with(|| {
                assert_eq!(Config::current().tie_strategy, TieStrategy::Max);
            });
            assert_eq!(Config::current().tie_strategy, TieStrategy::Min);
        });
        assert_eq!(Config::current().tie_strategy, TieStrategy::Average);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut cfg = Config::default();
        cfg.nan_strategy = NanStrategy::Min;
        cfg.row_split_threshold = Some(4096);

        let json = serde_json::to_string(&cfg).unwrap();
        let decoded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, cfg);
    }
}
