//! Cooperative cancellation.
//!
//! One [`CancellationToken`] is shared by every task of a run. Clones observe
//! the same signal; once cancelled a token stays cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Returned when a cancellation signal wins a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Shared cancellation signal
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Signal cancellation to every clone
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once cancellation is signalled
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run a future unless cancellation fires first
    pub async fn run_until_cancelled<F>(&self, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }

    /// Sleep for `duration`, returning early if cancelled
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.run_until_cancelled(tokio::time::sleep(duration)).await
    }
}
