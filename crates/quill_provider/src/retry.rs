use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use quill_domain::Error as DomainError;
use quill_env::RetryConfig;

use crate::Error;

/// Marks `error` as retryable when it carries a configured retry status code
/// or is a connect/timeout failure.
pub fn into_retry(error: anyhow::Error, retry_config: &RetryConfig) -> anyhow::Error {
    if let Some(code) = get_api_status_code(&error).or(get_req_status_code(&error))
        && retry_config.is_retryable_status(code)
    {
        return DomainError::Retryable(error).into();
    }

    if is_req_transport_error(&error) {
        return DomainError::Retryable(error).into();
    }

    error
}

fn get_api_status_code(error: &anyhow::Error) -> Option<u16> {
    error.downcast_ref::<Error>().and_then(|error| match error {
        Error::InvalidStatusCode { status, .. } => Some(*status),
        Error::EmptyContent { .. } => None,
    })
}

fn get_req_status_code(error: &anyhow::Error) -> Option<u16> {
    error
        .downcast_ref::<reqwest::Error>()
        .and_then(|error| error.status())
        .map(|status| status.as_u16())
}

fn is_req_transport_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<reqwest::Error>()
        .is_some_and(|error| error.is_timeout() || error.is_connect())
}

pub async fn retry_with_config<F, Fut, T>(config: &RetryConfig, operation: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    let mut strategy = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.min_delay_ms))
        .with_factor(config.backoff_factor as f32)
        .with_max_times(config.max_retry_attempts)
        .with_jitter();
    if let Some(max_delay) = config.max_delay {
        strategy = strategy.with_max_delay(Duration::from_secs(max_delay));
    }

    let suppress = config.suppress_retry_errors;
    operation
        .retry(strategy)
        .when(DomainError::is_retryable)
        .notify(move |error: &anyhow::Error, delay: Duration| {
            if !suppress {
                tracing::warn!(error = %error, delay_ms = delay.as_millis() as u64, "Retrying model call");
            }
        })
        .await
}
