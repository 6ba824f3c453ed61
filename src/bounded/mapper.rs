//! Bounded map with positionally-correct output

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use futures::{FutureExt, TryFutureExt};

use super::BoundedIter;
use super::executor::{Admission, RunReport, drive};
use super::types::{IterError, IterResult, StopReason};
use crate::runtime::AsyncTask;

/// Output array indexed by input position. Each slot is written once, by the
/// work item that owns that index, whatever order items settle in.
pub(crate) struct OutputSlots<T> {
    slots: Vec<Option<T>>,
    filled: usize,
}

impl<T> OutputSlots<T> {
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            filled: 0,
        }
    }

    pub(crate) fn fill(&mut self, index: usize, value: T) {
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_none(), "output slot {index} written twice");
        if slot.replace(value).is_none() {
            self.filled += 1;
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.slots.into_iter().flatten().collect()
    }
}

pub(crate) async fn map_slots<In, T, E, F, Fut>(
    items: Vec<In>,
    admission: &Admission<'_>,
    start: F,
) -> (OutputSlots<T>, RunReport<E>)
where
    F: FnMut(usize, In) -> Fut,
    Fut: Future<Output = IterResult<T, E>>,
{
    let mut slots = OutputSlots::with_len(items.len());
    let report = drive(items, admission, start, |index, value| slots.fill(index, value)).await;
    (slots, report)
}

fn collect_slots<T, E>(slots: OutputSlots<T>, report: RunReport<E>) -> IterResult<Vec<T>, E> {
    let RunReport { summary, failure } = report;
    if let Some(err) = failure {
        return Err(err);
    }
    match summary.stop {
        StopReason::Completed => {
            debug_assert!(slots.is_complete());
            Ok(slots.into_vec())
        }
        StopReason::Cancelled => Err(IterError::Cancelled {
            admitted: summary.admitted,
            total: summary.total,
        }),
        StopReason::Aborted => Err(IterError::Aborted {
            settled: summary.settled,
            in_flight: summary.abandoned,
        }),
    }
}

impl BoundedIter<'_> {
    /// Map every element through `f`, keeping input order in the output.
    ///
    /// Only fails when the run is stopped before every element was mapped.
    pub async fn map<In, T, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut f: F,
    ) -> IterResult<Vec<T>, Infallible>
    where
        F: FnMut(In) -> Fut,
        Fut: Future<Output = T>,
    {
        let admission = self.admission();
        let (slots, report) = map_slots(items.into_iter().collect(), &admission, |_, item| {
            f(item).map(Ok::<T, IterError<Infallible>>)
        })
        .await;
        collect_slots(slots, report)
    }

    /// Fallible [`map`](Self::map). Reports the first failure observed once
    /// every admitted item has settled.
    pub async fn try_map<In, T, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut f: F,
    ) -> IterResult<Vec<T>, E>
    where
        F: FnMut(In) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admission();
        let (slots, report) = map_slots(items.into_iter().collect(), &admission, |index, item| {
            f(item).map_err(move |error| IterError::Item { index, error })
        })
        .await;
        collect_slots(slots, report)
    }

    /// [`try_map`](Self::try_map) with every admitted item spawned onto the
    /// tokio runtime at admission time.
    ///
    /// Work that is still running when the run is aborted keeps running in
    /// the background. A task that panics surfaces as
    /// [`IterError::TaskLost`].
    pub async fn try_spawn_map<In, T, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = In>,
        mut f: F,
    ) -> IterResult<Vec<T>, E>
    where
        F: FnMut(In) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let admission = self.admission();
        let (slots, report) = map_slots(items.into_iter().collect(), &admission, |index, item| {
            AsyncTask::spawn_async(index, f(item))
        })
        .await;
        collect_slots(slots, report)
    }

    /// Blocking variant: `f` runs on tokio's blocking pool, with the same
    /// window over how many calls run at once.
    pub async fn try_map_blocking<In, T, E, F>(
        &self,
        items: impl IntoIterator<Item = In>,
        f: F,
    ) -> IterResult<Vec<T>, E>
    where
        F: Fn(In) -> Result<T, E> + Send + Sync + 'static,
        In: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let f = Arc::new(f);
        let admission = self.admission();
        let (slots, report) = map_slots(items.into_iter().collect(), &admission, |index, item| {
            let f = Arc::clone(&f);
            AsyncTask::spawn(index, move || f(item))
        })
        .await;
        collect_slots(slots, report)
    }
}
