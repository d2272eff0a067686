//! Bounded retry with exponential backoff for idempotent reads.
//!
//! Only lookups and traversals go through here. Mutations are never retried:
//! a partial-document merge that timed out may already have been applied.

use std::future::Future;
use std::time::Duration;

use crate::client::{GraphConfig, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        retries: 0,
        backoff: Duration::ZERO,
    };

    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            retries: config.read_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

/// Run `op`, retrying transient failures up to `policy.retries` times.
pub async fn with_read_retry<T, F, Fut>(policy: RetryPolicy, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < policy.retries => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient store error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
