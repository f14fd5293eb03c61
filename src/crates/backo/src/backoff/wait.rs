//! Cancellable waiting on a computed backoff
//!
//! [`BackoffCalculator::wait_for`] suspends the calling task on the tokio
//! timer. It holds no locks while suspended.

use super::calculator::BackoffCalculator;
use crate::logging::format_duration;
use crate::{BackoError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable handle used to abort backoff waits
///
/// All clones share the same state; cancelling one cancels them all.
/// Cancellation is permanent.
///
/// # Example
///
/// ```rust
/// use backo::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every wait observing this token, now or later
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl BackoffCalculator {
    /// Wait for the backoff of `attempt`, unless `cancel` fires first
    ///
    /// # Returns
    ///
    /// The delay that was waited out.
    ///
    /// # Errors
    ///
    /// Returns [`BackoError::Cancelled`] if the token is cancelled before or
    /// during the wait.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use backo::{BackoffCalculator, CancelToken};
    ///
    /// let backoff = BackoffCalculator::default();
    /// let shutdown = CancelToken::new();
    ///
    /// let waited = backoff.wait_for(0, &shutdown).await?;
    /// assert_eq!(waited.as_millis(), 100);
    /// ```
    pub async fn wait_for(&self, attempt: u32, cancel: &CancelToken) -> Result<Duration> {
        let delay = self.compute(attempt);

        if cancel.is_cancelled() {
            debug!(attempt, "Backoff cancelled before waiting");
            return Err(BackoError::Cancelled {
                attempt,
                elapsed: Duration::ZERO,
            });
        }

        debug!(attempt, "Backing off for {}", format_duration(delay));
        let start = Instant::now();

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                debug!(attempt, "Backoff of {} elapsed", format_duration(delay));
                Ok(delay)
            }
            _ = cancel.cancelled() => {
                let elapsed = start.elapsed();
                debug!(attempt, "Backoff cancelled after {}", format_duration(elapsed));
                Err(BackoError::Cancelled { attempt, elapsed })
            }
        }
    }
}
