//! Tracks in-flight calls so they can be cancelled all at once.

use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Hands each call a child of one shared token.
///
/// Cancelling the shared token reaches every call registered so far. It is
/// then swapped for a fresh one, so later calls start uncancelled.
#[derive(Clone, Default)]
pub struct CallTracker {
    current: Arc<Mutex<CancellationToken>>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a call that is starting now.
    pub fn register(&self) -> CancellationToken {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .child_token()
    }

    /// Cancel every call registered before this point.
    pub fn cancel_all(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
    }
}
