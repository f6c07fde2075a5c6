//! Retry and backoff policy shared by every remote call.

use crate::error::CloudResult;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff: `initial * 2^attempt`, capped at `max_backoff_ms`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Runs `call`, repeating it while it fails with a retryable error.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> CloudResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CloudResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_retryable() && attempt + 1 < self.attempts() => {
                    let backoff = self.backoff(attempt);
                    warn!("{operation} failed ({e}), retrying in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Polls `check` until it yields a value or attempts run out.
    pub async fn poll<T, F, Fut>(&self, mut check: F) -> CloudResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CloudResult<Option<T>>>,
    {
        for attempt in 0..self.attempts() {
            if let Some(value) = check().await? {
                return Ok(Some(value));
            }
            if attempt + 1 < self.attempts() {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }
        Ok(None)
    }
}
