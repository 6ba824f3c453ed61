//! Bounded-concurrency async iteration
//!
//! Applies an async operation to every element of a sequence while capping
//! how many operations are in flight at once. Admission follows a sliding
//! window: once the window is full, each settled item frees exactly one slot
//! for the next pending element.

mod config;
mod convenience;
mod executor;
mod finder;
mod mapper;
mod signal;
mod types;

pub use config::{AfterMatch, ConcurrencyLimit, IterConfig};
pub use convenience::{find_first_match, for_each, map};
pub use signal::CancellationSignal;
pub use types::{IterError, IterResult, MatchResult, RunSummary, SearchOutcome, StopReason};

use executor::Admission;
use tokio_util::sync::CancellationToken;

/// Builder for bounded runs.
///
/// Holds the normalised limit and match policy plus the optional stop
/// controls a run observes: a [`CancellationSignal`] that halts admission,
/// and an external [`CancellationToken`] that aborts the wait altogether.
#[derive(Debug, Clone, Default)]
pub struct BoundedIter<'a> {
    limit: ConcurrencyLimit,
    after_match: AfterMatch,
    signal: Option<&'a CancellationSignal>,
    abort: Option<&'a CancellationToken>,
}

impl<'a> BoundedIter<'a> {
    /// `0` means unbounded.
    #[must_use]
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            limit: ConcurrencyLimit::new(concurrency_limit),
            ..Self::default()
        }
    }

    /// Signed limits from the config are normalised here, once.
    #[must_use]
    pub fn with_config(config: &IterConfig) -> Self {
        Self {
            limit: config.limit(),
            after_match: config.after_match,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn after_match(mut self, policy: AfterMatch) -> Self {
        self.after_match = policy;
        self
    }

    /// Stop admitting new elements once `signal` is set. Elements already
    /// admitted are still waited for.
    #[must_use]
    pub fn until(mut self, signal: &'a CancellationSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Stop waiting on in-flight work once `token` is cancelled.
    #[must_use]
    pub fn abort_on(mut self, token: &'a CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    #[must_use]
    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    #[must_use]
    pub fn match_policy(&self) -> AfterMatch {
        self.after_match
    }

    fn admission(&self) -> Admission<'a> {
        Admission::new(self.limit, self.signal, self.abort)
    }
}
