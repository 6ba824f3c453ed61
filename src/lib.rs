//! `kodegen_async_iter` - bounded-concurrency async iteration
//!
//! Applies an async operation to every element of a sequence while capping
//! the number of operations in flight, and searches for a first match with
//! early stop. Built on tokio and `futures`.

// Module declarations
pub mod bounded;
pub mod runtime;

// Re-export runtime types
pub use runtime::AsyncTask;

// Re-export bounded iteration types
pub use bounded::{
    AfterMatch, BoundedIter, CancellationSignal, ConcurrencyLimit, IterConfig, IterError,
    IterResult, MatchResult, RunSummary, SearchOutcome, StopReason,
    // One-off entry points
    find_first_match, for_each, map,
};

// External abort token accepted by `BoundedIter::abort_on`
pub use tokio_util::sync::CancellationToken;
