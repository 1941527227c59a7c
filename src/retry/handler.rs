//! Caller-supplied retry decisions.
//!
//! The retry layer never decides on its own whether a failure is worth
//! another attempt. It hands the error to an [`ErrorHandler`]: `Ok(())` means
//! "re-seek and try again", `Err(e)` means "give up and report `e`". Any
//! delay, attempt budget or logging is the handler's business.
//!
//! Plain closures work through [`handler_fn`]; [`Backoff`] layers an
//! exponential backoff with an attempt limit on top.

use crate::error::{Error, Result};

use async_trait::async_trait;
use reqwest_retry::{policies::ExponentialBackoff, RetryDecision, RetryPolicy};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

/// Decides whether a failed read or seek should be attempted again.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Returns `Ok(())` to retry, or the error to surface to the caller.
    async fn handle(&self, error: Error) -> Result<()>;
}

#[async_trait]
impl<F> ErrorHandler for F
where
    F: Fn(Error) -> Result<()> + Send + Sync,
{
    async fn handle(&self, error: Error) -> Result<()> {
        self(error)
    }
}

/// An error handler shared between a transport and the readers it creates.
pub type SharedErrorHandler = Arc<dyn ErrorHandler>;

/// Wraps a closure as a [`SharedErrorHandler`].
///
/// ```rust
/// use httpseek::retry::handler_fn;
///
/// // Retry everything the retry layer considers recoverable.
/// let handler = handler_fn(|_error| Ok(()));
/// ```
pub fn handler_fn<F>(f: F) -> SharedErrorHandler
where
    F: Fn(Error) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Retries transient errors with exponential backoff, up to a fixed budget.
///
/// The budget is shared by every read the handler is attached to; it is not
/// reset by successful reads.
pub struct Backoff {
    policy: ExponentialBackoff,
    started: SystemTime,
    retries: AtomicU32,
}

impl Backoff {
    /// Allows `max_retries` retries with the default backoff bounds.
    pub fn new(max_retries: u32) -> Self {
        Self::with_policy(ExponentialBackoff::builder().build_with_max_retries(max_retries))
    }

    /// Uses a custom policy, e.g. with tighter retry bounds.
    pub fn with_policy(policy: ExponentialBackoff) -> Self {
        Self {
            policy,
            started: SystemTime::now(),
            retries: AtomicU32::new(0),
        }
    }

    /// Number of retries approved so far.
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("retries", &self.retries())
            .finish()
    }
}

#[async_trait]
impl ErrorHandler for Backoff {
    async fn handle(&self, error: Error) -> Result<()> {
        if !error.is_transient() {
            return Err(error);
        }

        let past_retries = self.retries();
        match self.policy.should_retry(self.started, past_retries) {
            RetryDecision::Retry { execute_after } => {
                let delay = execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or_default();
                warn!(
                    error = %error,
                    attempt = past_retries + 1,
                    ?delay,
                    "Retrying after failure"
                );
                self.retries.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(())
            }
            RetryDecision::DoNotRetry => Err(error),
        }
    }
}
