//! Bounded exponential-backoff retries
//!
//! Turns a single unreliable print attempt into a resilient job
//! outcome. Attempts run strictly sequentially; the device state is
//! reset between attempts so a stuck handle from attempt N cannot
//! poison attempt N+1.

use crate::error::{PrintError, PrintResult};
use crate::session::PrinterSession;
use std::time::Duration;
use tracing::warn;

/// Retry configuration
///
/// One instance is shared by all jobs; `delay(k) = base_delay * 2^(k-1)`
/// between attempts k and k+1.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted after the given attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Run an operation with bounded exponential-backoff retries
///
/// The operation receives the attempt number (1-based). Between
/// attempts - never after the final one - this sleeps the policy delay
/// and invalidates the session's cached handle. On exhaustion the last
/// error is surfaced verbatim.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    session: &PrinterSession,
    mut operation: F,
) -> PrintResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PrintResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Print attempt failed");
                last_error = Some(e);

                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay(attempt)).await;
                    session.invalidate().await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| PrintError::Unavailable("No print attempts were made".to_string())))
}
