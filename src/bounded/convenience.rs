//! Free-function entry points for one-off bounded runs

use std::convert::Infallible;
use std::future::Future;

use futures::FutureExt;

use super::BoundedIter;
use super::mapper::map_slots;
use super::types::{IterError, MatchResult, RunSummary};

/// Map every element through `f` with at most `concurrency_limit` calls in
/// flight (`0` means unbounded).
///
/// `output[i]` is always `f(input[i])`, even when later elements finish
/// first.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let doubled = kodegen_async_iter::map(
///         vec![3u64, 2, 1],
///         |n| async move {
///             tokio::time::sleep(Duration::from_millis(n)).await;
///             n * 2
///         },
///         2,
///     )
///     .await;
///     assert_eq!(doubled, vec![6, 4, 2]);
/// }
/// ```
pub async fn map<In, T, F, Fut>(
    items: impl IntoIterator<Item = In>,
    mut f: F,
    concurrency_limit: usize,
) -> Vec<T>
where
    F: FnMut(In) -> Fut,
    Fut: Future<Output = T>,
{
    let bounded = BoundedIter::new(concurrency_limit);
    let admission = bounded.admission();
    let (slots, report) = map_slots(items.into_iter().collect(), &admission, |_, item| {
        f(item).map(Ok::<T, IterError<Infallible>>)
    })
    .await;
    debug_assert!(report.failure.is_none() && !report.summary.stopped_early());
    debug_assert!(slots.is_complete());
    slots.into_vec()
}

/// Run `action` over every element with at most `concurrency_limit` in
/// flight (`0` means unbounded). Resolves once every action has settled.
pub async fn for_each<In, F, Fut>(
    items: impl IntoIterator<Item = In>,
    action: F,
    concurrency_limit: usize,
) -> RunSummary
where
    F: FnMut(In) -> Fut,
    Fut: Future<Output = ()>,
{
    BoundedIter::new(concurrency_limit)
        .for_each(items, action)
        .await
}

/// Find an element for which `predicate` resolves to `true`.
///
/// Returns `(T::default(), false)` when nothing matches. Under a window wider
/// than one, the winner is whichever evaluation settled first as `true`.
pub async fn find_first_match<In, F, Fut>(
    items: impl IntoIterator<Item = In>,
    predicate: F,
    concurrency_limit: usize,
) -> MatchResult<In>
where
    In: Clone + Default,
    F: FnMut(In) -> Fut,
    Fut: Future<Output = bool>,
{
    BoundedIter::new(concurrency_limit)
        .find_first_match(items, predicate)
        .await
        .into()
}
