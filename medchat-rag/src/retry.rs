//! Bounded retry with exponential backoff for provider HTTP calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Worth trying again (timeouts, 429, 5xx, dropped connections).
    Transient(String),
    /// Retrying cannot help (bad credentials, malformed request or response).
    Fatal(String),
}

impl AttemptError {
    pub(crate) fn into_message(self) -> String {
        match self {
            AttemptError::Transient(m) | AttemptError::Fatal(m) => m,
        }
    }
}

/// How many times, and how patiently, a provider call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never less than one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `attempt` until it succeeds, fails fatally, or attempts run out.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        provider: &str,
        mut attempt: F,
    ) -> std::result::Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut tried = 0;
        loop {
            tried += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Transient(message)) if tried < max_attempts => {
                    let delay = self.backoff(tried);
                    warn!(
                        provider,
                        attempt = tried,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into_message()),
            }
        }
    }
}

/// Classify an HTTP status code.
pub(crate) fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}
