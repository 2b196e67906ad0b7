//! Bounded fixed-interval polling.

use anyhow::Result;
use edc_common::{EdcError, ErrorCode};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: edc_common::config::settings::DEFAULT_POLL_INTERVAL,
            attempts: edc_common::config::settings::DEFAULT_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Longest time spent sleeping before giving up.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}

/// Call `op` until it yields `Some`, at most `policy.attempts` times.
///
/// Sleeps `policy.interval` between attempts, never after the last one.
/// Errors from `op` end polling immediately. Exhaustion raises
/// `ApiPollTimeout`.
pub async fn poll_until<T, F, Fut>(policy: PollPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(value) = op(attempt).await? {
            tracing::debug!(what, attempt, "Poll succeeded");
            return Ok(value);
        }
        tracing::debug!(what, attempt, attempts, "Not ready yet");
        if attempt < attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(EdcError::new(
        ErrorCode::ApiPollTimeout,
        format!(
            "{what} not ready after {attempts} attempts ({} apart)",
            humantime::format_duration(policy.interval)
        ),
    )
    .into())
}
