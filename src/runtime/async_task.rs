//! Spawned work items for bounded iteration.
//!
//! Work is started on the tokio runtime at admission and its outcome travels
//! back over a oneshot channel, so dropping the handle never stops the work.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::sync::oneshot;

use crate::bounded::{IterError, IterResult};

/// Handle to one spawned work item, tagged with its input position.
///
/// Resolves to the work's own result with failures attributed to `index`.
/// If the work drops its result without sending it (it panicked), the
/// handle resolves to [`IterError::TaskLost`].
pub struct AsyncTask<T, E> {
    index: usize,
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> AsyncTask<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Run a blocking closure for item `index` on the blocking thread pool.
    pub fn spawn<F>(index: usize, f: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(f());
        });
        Self { index, rx }
    }

    /// Start the future for item `index` on the runtime right away.
    pub fn spawn_async<F>(index: usize, future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn(async move {
            let _ = tx.send(future.await);
        });
        Self { index, rx }
    }
}

impl<T, E> AsyncTask<T, E> {
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T, E> Future for AsyncTask<T, E> {
    type Output = IterResult<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let index = self.index;
        let outcome = ready!(Pin::new(&mut self.rx).poll(cx));
        Poll::Ready(match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(IterError::Item { index, error }),
            Err(_) => Err(IterError::TaskLost { index }),
        })
    }
}
