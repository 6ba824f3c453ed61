//! Shared "stop admitting new work" flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A one-way flag that stops a run from admitting further work items.
///
/// Clones share the same state. Setting the flag never interrupts work that
/// has already been admitted; the admission loop polls it before each
/// admission.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Idempotent.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
