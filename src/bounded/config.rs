//! Configuration for bounded iteration

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// How many work items may be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConcurrencyLimit {
    /// Every element is admitted immediately.
    #[default]
    Unbounded,
    /// Sliding window of at most this many in-flight items.
    Bounded(NonZeroUsize),
}

impl ConcurrencyLimit {
    /// `0` means unbounded.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        NonZeroUsize::new(limit).map_or(Self::Unbounded, Self::Bounded)
    }

    /// Any non-positive value means unbounded.
    #[must_use]
    pub fn from_signed(limit: i64) -> Self {
        if limit <= 0 {
            return Self::Unbounded;
        }
        Self::new(usize::try_from(limit).unwrap_or(usize::MAX))
    }

    #[must_use]
    pub fn get(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(n.get()),
        }
    }

    #[must_use]
    pub fn is_bounded(self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Effective window size for an input of `len` elements.
    #[must_use]
    pub fn window(self, len: usize) -> usize {
        match self {
            Self::Unbounded => len,
            Self::Bounded(n) => n.get().min(len),
        }
    }
}

impl From<usize> for ConcurrencyLimit {
    fn from(limit: usize) -> Self {
        Self::new(limit)
    }
}

/// What the first-match finder does with evaluations still in flight once a
/// match has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterMatch {
    /// Return immediately. Local evaluations are dropped at their next
    /// suspension point; spawned ones finish in the background.
    #[default]
    Abandon,
    /// Wait for every admitted evaluation to settle before returning.
    Drain,
}

/// Configuration for bounded iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterConfig {
    /// Maximum in-flight work items; non-positive means unbounded.
    pub concurrency_limit: i64,
    pub after_match: AfterMatch,
}

impl Default for IterConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 0,
            after_match: AfterMatch::Abandon,
        }
    }
}

impl IterConfig {
    #[must_use]
    pub fn limit(&self) -> ConcurrencyLimit {
        ConcurrencyLimit::from_signed(self.concurrency_limit)
    }
}
