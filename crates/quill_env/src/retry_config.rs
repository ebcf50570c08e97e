use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Backoff policy for model calls. Only errors classified as retryable by the
/// provider are retried.
#[derive(Debug, Clone, Serialize, Deserialize, Setters, PartialEq, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[setters(into)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds
    pub min_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: u64,

    /// Retries after the first attempt
    pub max_retry_attempts: usize,

    /// Response codes treated as transient
    pub retry_status_codes: Vec<u16>,

    /// Upper bound on a single delay, in seconds
    #[serde(default)]
    pub max_delay: Option<u64>,

    #[serde(default)]
    pub suppress_retry_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            backoff_factor: 2,
            max_retry_attempts: 8,
            retry_status_codes: vec![408, 429, 500, 502, 503, 504],
            max_delay: None,
            suppress_retry_errors: false,
        }
    }
}

impl RetryConfig {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}
