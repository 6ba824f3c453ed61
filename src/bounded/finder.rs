//! First-match search over a bounded window
//!
//! The first predicate evaluation to *settle* as `true` wins, which under a
//! window wider than one is not necessarily the earliest element by input
//! position. Once a match is committed the search's own signal stops further
//! admission and later `true` results are ignored.

use std::convert::Infallible;
use std::future::Future;

use futures::{FutureExt, TryFutureExt};
use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use super::BoundedIter;
use super::config::AfterMatch;
use super::executor::{RunReport, drive};
use super::signal::CancellationSignal;
use super::types::{IterError, IterResult, SearchOutcome, StopReason};
use crate::runtime::AsyncTask;

/// A match that landed, plus how the run ended.
struct SearchReport<In, E> {
    matched: Option<In>,
    report: RunReport<E>,
}

impl<In, E> SearchReport<In, E> {
    /// A committed match beats failures and aborts; a failure beats an abort.
    fn into_result(self) -> IterResult<SearchOutcome<In>, E> {
        if let Some(item) = self.matched {
            return Ok(SearchOutcome::Found(item));
        }
        if let Some(err) = self.report.failure {
            return Err(err);
        }
        Ok(Self::unmatched(self.report.summary.stop))
    }

    fn unmatched(stop: StopReason) -> SearchOutcome<In> {
        match stop {
            StopReason::Completed => SearchOutcome::NotFound,
            StopReason::Cancelled | StopReason::Aborted => SearchOutcome::Aborted,
        }
    }
}

impl BoundedIter<'_> {
    async fn search<In, E, F, Fut>(&self, items: Vec<In>, mut evaluate: F) -> SearchReport<In, E>
    where
        In: Clone,
        F: FnMut(usize, In, CancellationToken) -> Fut,
        Fut: Future<Output = IterResult<bool, E>>,
    {
        let found = CancellationSignal::new();
        let search_token = CancellationToken::new();
        let abandon = self.after_match == AfterMatch::Abandon;
        let base = self.admission();
        let admission = base.with_local(&found, abandon);
        let mut matched = None;

        let report = drive(
            items,
            &admission,
            |index, item: In| {
                let verdict = evaluate(index, item.clone(), search_token.child_token());
                async move { verdict.await.map(|hit| hit.then_some(item)) }
            },
            |index, hit: Option<In>| {
                let Some(item) = hit else {
                    return;
                };
                if matched.is_some() {
                    trace!("match at index {index} settled after the search resolved");
                    return;
                }
                debug!("match committed at index {index}");
                matched = Some(item);
                found.cancel();
                search_token.cancel();
            },
        )
        .await;

        // Evaluations left behind observe the search as over.
        search_token.cancel();
        SearchReport { matched, report }
    }

    /// Find an element for which `predicate` resolves to `true`.
    ///
    /// With [`AfterMatch::Abandon`] (the default) this returns as soon as the
    /// match commits and drops evaluations still in flight. With
    /// [`AfterMatch::Drain`] it first waits for them to settle.
    pub async fn find_first_match<In, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut predicate: F,
    ) -> SearchOutcome<In>
    where
        In: Clone,
        F: FnMut(In) -> Fut,
        Fut: Future<Output = bool>,
    {
        let search = self
            .search(items.into_iter().collect(), |_, item, _| {
                predicate(item).map(Ok::<bool, IterError<Infallible>>)
            })
            .await;
        match search.matched {
            Some(item) => SearchOutcome::Found(item),
            None => SearchReport::<In, Infallible>::unmatched(search.report.summary.stop),
        }
    }

    /// Fallible [`find_first_match`](Self::find_first_match).
    pub async fn try_find_first_match<In, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut predicate: F,
    ) -> IterResult<SearchOutcome<In>, E>
    where
        In: Clone,
        F: FnMut(In) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.search(items.into_iter().collect(), |index, item, _| {
            predicate(item).map_err(move |error| IterError::Item { index, error })
        })
        .await
        .into_result()
    }

    /// Search where each predicate call receives a token that is cancelled
    /// once the search resolves, so slow evaluations can stop themselves.
    pub async fn try_find_cooperative<In, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut predicate: F,
    ) -> IterResult<SearchOutcome<In>, E>
    where
        In: Clone,
        F: FnMut(In, CancellationToken) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.search(items.into_iter().collect(), |index, item, token| {
            predicate(item, token).map_err(move |error| IterError::Item { index, error })
        })
        .await
        .into_result()
    }

    /// Search with every predicate evaluation spawned onto the runtime at
    /// admission. Evaluations still running after the search resolves finish
    /// in the background; their results are discarded.
    pub async fn spawn_find_first_match<In, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut predicate: F,
    ) -> IterResult<SearchOutcome<In>, E>
    where
        In: Clone,
        F: FnMut(In) -> Fut,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
        E: Send + 'static,
    {
        self.search(items.into_iter().collect(), |index, item, _| {
            AsyncTask::spawn_async(index, predicate(item))
        })
        .await
        .into_result()
    }
}
