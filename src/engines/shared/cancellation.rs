// Hand-rolled cancellation token (no teacher or pack file imports
// `tokio-util`, so this is built directly on `tokio::sync::Notify` rather
// than pulling in `CancellationToken` from an extra crate).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called (or immediately if it
    /// already has been).
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Races `fut` against cancellation. On cancellation, `fut` is dropped —
/// any partial work it held is discarded, matching the specification's
/// "in-flight pricing lookups are abandoned" cancellation contract.
pub async fn run_cancellable<F>(fut: F, token: Option<&CancellationToken>) -> Option<F::Output>
where
    F: Future,
{
    match token {
        None => Some(fut.await),
        Some(token) => {
            tokio::select! {
                output = fut => Some(output),
                _ = token.cancelled() => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_future_yields_none() {
        let token = CancellationToken::new();
        token.cancel();
        let result = run_cancellable(
            async {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                42
            },
            Some(&token),
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn uncancelled_future_completes() {
        let token = CancellationToken::new();
        let result = run_cancellable(async { 7 }, Some(&token)).await;
        assert_eq!(result, Some(7));
    }
}
