//! Lifetime guard for a view waiting on a request.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether the view that issued a request is still showing.
///
/// In-flight requests are not cancelled; their results are dropped once the
/// scope is dismissed.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    dismissed: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view as gone. Clones share the flag.
    pub fn dismiss(&self) {
        self.dismissed.store(true, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        !self.dismissed.load(Ordering::Acquire)
    }

    /// Await `operation` and hand back its output only if the view is still live.
    pub async fn run<F: Future>(&self, operation: F) -> Option<F::Output> {
        let output = operation.await;
        if self.is_live() {
            Some(output)
        } else {
            tracing::debug!("Dropping result for a dismissed view");
            None
        }
    }
}
