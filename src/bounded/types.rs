//! Outcome and error types for bounded iteration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced once a run reaches its wait barrier.
///
/// Failures never stop admission. The run keeps going and the first failure
/// it observed is the one reported.
#[derive(Error, Debug)]
pub enum IterError<E> {
    #[error("work item {index} failed: {error}")]
    Item { index: usize, error: E },

    #[error("work item {index} dropped its result before settling")]
    TaskLost { index: usize },

    #[error("run stopped by signal after admitting {admitted} of {total} items")]
    Cancelled { admitted: usize, total: usize },

    #[error("run aborted with {in_flight} items in flight after {settled} settled")]
    Aborted { settled: usize, in_flight: usize },
}

pub type IterResult<T, E> = Result<T, IterError<E>>;

impl<E> IterError<E> {
    /// Input position of the failing item, when there is one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Item { index, .. } | Self::TaskLost { index } => Some(*index),
            Self::Cancelled { .. } | Self::Aborted { .. } => None,
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// The caller's error for [`IterError::Item`].
    pub fn into_item_error(self) -> Option<E> {
        match self {
            Self::Item { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every element was admitted and every admitted item settled.
    Completed,
    /// A cancellation signal stopped admission while work remained.
    Cancelled,
    /// An external abort token fired while the run was waiting.
    Aborted,
}

/// Bookkeeping for one run of the admission loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub admitted: usize,
    pub settled: usize,
    pub failed: usize,
    /// Items still in flight when the run returned without draining.
    pub abandoned: usize,
    pub peak_in_flight: usize,
    pub stop: StopReason,
}

impl RunSummary {
    #[must_use]
    pub fn stopped_early(&self) -> bool {
        self.stop != StopReason::Completed
    }

    /// Elements that were never admitted.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.total - self.admitted
    }
}

/// Terminal outcome of a first-match search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    Found(T),
    NotFound,
    /// The caller stopped the search before any match landed.
    Aborted,
}

impl<T> SearchOutcome<T> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Aborted => None,
        }
    }
}

/// `(value, found)` pair; `value` is `T::default()` when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult<T> {
    pub value: T,
    pub found: bool,
}

impl<T> MatchResult<T> {
    #[must_use]
    pub fn found(value: T) -> Self {
        Self { value, found: true }
    }

    pub fn into_parts(self) -> (T, bool) {
        (self.value, self.found)
    }
}

impl<T: Default> MatchResult<T> {
    #[must_use]
    pub fn not_found() -> Self {
        Self::default()
    }
}

impl<T: Default> From<SearchOutcome<T>> for MatchResult<T> {
    fn from(outcome: SearchOutcome<T>) -> Self {
        match outcome {
            SearchOutcome::Found(value) => Self::found(value),
            SearchOutcome::NotFound | SearchOutcome::Aborted => Self::not_found(),
        }
    }
}
