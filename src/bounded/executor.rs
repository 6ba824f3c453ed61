//! Sliding-window admission loop shared by every bounded operation

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::{FutureExt, TryFutureExt};
use log::{debug, trace, warn};
use tokio_util::sync::CancellationToken;

use super::BoundedIter;
use super::config::ConcurrencyLimit;
use super::signal::CancellationSignal;
use super::types::{IterError, IterResult, RunSummary, StopReason};

/// One admitted unit of work. Carries its input position by value so the
/// settled output can be routed without any shared index.
struct WorkItem<Fut> {
    index: usize,
    future: Pin<Box<Fut>>,
}

impl<Fut: Future> Future for WorkItem<Fut> {
    type Output = (usize, Fut::Output);

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let index = self.index;
        self.future.as_mut().poll(cx).map(|output| (index, output))
    }
}

/// In-flight membership. Owned by the admission loop, which is the only
/// writer, so "remove a settled item, then admit the next" needs no locking.
struct InFlight<Fut> {
    items: FuturesUnordered<WorkItem<Fut>>,
    window: usize,
    admitted: usize,
    settled: usize,
    peak: usize,
}

impl<Fut: Future> InFlight<Fut> {
    fn new(window: usize) -> Self {
        Self {
            items: FuturesUnordered::new(),
            window,
            admitted: 0,
            settled: 0,
            peak: 0,
        }
    }

    fn has_capacity(&self) -> bool {
        self.items.len() < self.window
    }

    fn admit(&mut self, index: usize, future: Fut) {
        self.items.push(WorkItem {
            index,
            future: Box::pin(future),
        });
        self.admitted += 1;
        self.peak = self.peak.max(self.items.len());
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wait for any in-flight item to settle. `None` once the set is empty.
    async fn next_settled(&mut self) -> Option<(usize, Fut::Output)> {
        let next = self.items.next().await;
        if next.is_some() {
            self.settled += 1;
        }
        next
    }
}

/// Per-run admission rules.
///
/// The caller's signal only stops admission: work already admitted is always
/// waited for. A signal owned by the current call may additionally end the
/// run without waiting, when `abandon_on_local` is set.
pub(crate) struct Admission<'a> {
    pub(crate) limit: ConcurrencyLimit,
    signal: Option<&'a CancellationSignal>,
    local: Option<&'a CancellationSignal>,
    abandon_on_local: bool,
    abort: Option<&'a CancellationToken>,
}

impl<'a> Admission<'a> {
    pub(crate) fn new(
        limit: ConcurrencyLimit,
        signal: Option<&'a CancellationSignal>,
        abort: Option<&'a CancellationToken>,
    ) -> Self {
        Self {
            limit,
            signal,
            local: None,
            abandon_on_local: false,
            abort,
        }
    }

    /// Add a signal owned by the current call alongside the caller's one.
    pub(crate) fn with_local<'b>(
        &self,
        local: &'b CancellationSignal,
        abandon_on_local: bool,
    ) -> Admission<'b>
    where
        'a: 'b,
    {
        Admission {
            limit: self.limit,
            signal: self.signal,
            local: Some(local),
            abandon_on_local,
            abort: self.abort,
        }
    }

    fn stop_requested(&self) -> bool {
        [self.signal, self.local]
            .into_iter()
            .flatten()
            .any(CancellationSignal::is_cancelled)
    }

    /// Only the call's own signal can end a run with work still in flight.
    fn abandon_requested(&self) -> bool {
        self.abandon_on_local && self.local.is_some_and(CancellationSignal::is_cancelled)
    }

    fn aborted(&self) -> bool {
        self.abort.is_some_and(CancellationToken::is_cancelled)
    }
}

/// What a run leaves behind: its bookkeeping plus the first failure seen.
pub(crate) struct RunReport<E> {
    pub(crate) summary: RunSummary,
    pub(crate) failure: Option<IterError<E>>,
}

impl<E> RunReport<E> {
    pub(crate) fn into_result(self) -> IterResult<RunSummary, E> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.summary),
        }
    }
}

/// Run `start` over `items` inside the admission window.
///
/// Each successful output is handed to `on_settled` together with its input
/// position. Failures are counted and the first one is kept; they never stop
/// admission.
pub(crate) async fn drive<In, T, E, F, Fut, S>(
    items: Vec<In>,
    admission: &Admission<'_>,
    mut start: F,
    mut on_settled: S,
) -> RunReport<E>
where
    F: FnMut(usize, In) -> Fut,
    Fut: Future<Output = IterResult<T, E>>,
    S: FnMut(usize, T),
{
    let total = items.len();
    let mut pending = items.into_iter().enumerate();
    let mut in_flight = InFlight::new(admission.limit.window(total));
    let mut failed = 0;
    let mut failure = None;
    let mut stop = StopReason::Completed;

    loop {
        if admission.aborted() {
            stop = StopReason::Aborted;
            break;
        }

        while in_flight.has_capacity() && !admission.stop_requested() {
            let Some((index, item)) = pending.next() else {
                break;
            };
            trace!("admitting work item {index} ({} in flight)", in_flight.len());
            in_flight.admit(index, start(index, item));
        }

        if admission.stop_requested() {
            let abandoning = admission.abandon_requested() && !in_flight.is_empty();
            if pending.len() > 0 || abandoning {
                stop = StopReason::Cancelled;
            }
            if admission.abandon_requested() {
                break;
            }
        }

        let next = match admission.abort {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => None,
                next = in_flight.next_settled() => Some(next),
            },
            None => Some(in_flight.next_settled().await),
        };
        let Some(next) = next else {
            stop = StopReason::Aborted;
            break;
        };
        let Some((index, outcome)) = next else {
            break;
        };

        match outcome {
            Ok(value) => on_settled(index, value),
            Err(err) => {
                warn!("work item {index} failed, admission continues");
                failed += 1;
                failure.get_or_insert(err);
            }
        }
    }

    let summary = RunSummary {
        total,
        admitted: in_flight.admitted,
        settled: in_flight.settled,
        failed,
        abandoned: in_flight.len(),
        peak_in_flight: in_flight.peak,
        stop,
    };

    if stop == StopReason::Aborted {
        warn!(
            "bounded run aborted: {} settled, {} still in flight",
            summary.settled, summary.abandoned
        );
    } else {
        debug!("bounded run finished: {summary:?}");
    }

    RunReport { summary, failure }
}

impl BoundedIter<'_> {
    /// Run `action` over every element, at most `concurrency_limit` at a time.
    ///
    /// Admitted actions always run to completion, even after the run's
    /// signal is set. The returned summary says whether the run stopped
    /// early and why.
    pub async fn for_each<In, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut action: F,
    ) -> RunSummary
    where
        F: FnMut(In) -> Fut,
        Fut: Future<Output = ()>,
    {
        let admission = self.admission();
        let report = drive(
            items.into_iter().collect(),
            &admission,
            |_, item| action(item).map(Ok::<(), IterError<Infallible>>),
            |_, ()| {},
        )
        .await;
        report.summary
    }

    /// Fallible [`for_each`](Self::for_each).
    ///
    /// A failing action does not stop admission. Once every admitted action
    /// has settled, the first failure observed is returned.
    pub async fn try_for_each<In, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut action: F,
    ) -> IterResult<RunSummary, E>
    where
        F: FnMut(In) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let admission = self.admission();
        drive(
            items.into_iter().collect(),
            &admission,
            |index, item| action(item).map_err(move |error| IterError::Item { index, error }),
            |_, ()| {},
        )
        .await
        .into_result()
    }
}
