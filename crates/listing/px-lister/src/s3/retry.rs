//! Retry logic for S3 listing requests.
//!
//! Retries are off by default: a failed page ends the listing and the caller
//! keeps what was delivered so far. Raising `max_retries` enables exponential
//! backoff with jitter for transient errors.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries per request before giving up (0 = fail on first error).
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
    /// Whether to add jitter to backoff times.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff_ms(mut self, initial_backoff_ms: u64) -> Self {
        self.initial_backoff_ms = initial_backoff_ms;
        self
    }

    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff_ms = max_backoff_ms;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the backoff duration for a given attempt.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = base_ms.min(self.max_backoff_ms);

        let final_ms = if self.jitter {
            let jitter_range = capped_ms / 4; // 25% jitter
            let jitter = rand::rng().random_range(0..=jitter_range);
            capped_ms.saturating_add(jitter)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms)
    }
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// The error is transient and can be retried.
    Retryable,
    /// The error is permanent and should not be retried.
    NonRetryable,
}

/// Service error codes worth another attempt.
const RETRYABLE_CODES: &[&str] = &[
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "TooManyRequests",
    "RequestTimeout",
    "InternalError",
    "ServiceUnavailable",
];

/// Classify a service response by its error code and HTTP status.
///
/// Throttling codes, 429 and 5xx are retryable; missing buckets, access
/// errors and every other 4xx are not.
pub fn classify_response(code: Option<&str>, status: Option<u16>) -> ErrorClassification {
    if code.is_some_and(|c| RETRYABLE_CODES.contains(&c)) {
        return ErrorClassification::Retryable;
    }
    match status {
        Some(429) | Some(500..=599) => ErrorClassification::Retryable,
        _ => ErrorClassification::NonRetryable,
    }
}

/// Classify an SDK error for retry purposes.
///
/// Timeouts, dispatch failures and unreadable responses are retryable.
/// Service errors go through [`classify_response`]. Requests that could not
/// be built are not retried.
pub fn classify_sdk_error<E>(error: &SdkError<E, HttpResponse>) -> ErrorClassification
where
    E: ProvideErrorMetadata,
{
    match error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorClassification::Retryable
        }
        SdkError::ServiceError(context) => classify_response(
            context.err().code(),
            Some(context.raw().status().as_u16()),
        ),
        _ => ErrorClassification::NonRetryable,
    }
}

/// Execute an async operation with retry logic.
///
/// `classify` decides whether an error is worth another attempt. Returns the
/// first success, the first non-retryable error, or the error of the final
/// attempt.
pub async fn with_retry<F, Fut, T, E, C>(
    config: &RetryConfig,
    operation_name: &str,
    classify: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    C: Fn(&E) -> ErrorClassification,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if classify(&error) == ErrorClassification::NonRetryable {
            warn!(
                operation = operation_name,
                attempt = attempt,
                error = %error,
                "Non-retryable error"
            );
            return Err(error);
        }

        if attempt >= config.max_retries {
            return Err(error);
        }

        let backoff = config.backoff_duration(attempt);
        warn!(
            operation = operation_name,
            attempt = attempt,
            error = %error,
            backoff_ms = backoff.as_millis(),
            "Retryable error, backing off"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert!(config.jitter);
    }

    #[test]
    fn test_backoff_duration_no_jitter() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(100)
            .with_max_backoff_ms(10000)
            .with_jitter(false);

        assert_eq!(config.backoff_duration(0), Duration::from_millis(100));
        assert_eq!(config.backoff_duration(1), Duration::from_millis(200));
        assert_eq!(config.backoff_duration(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_duration_capped() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(1000)
            .with_max_backoff_ms(2000)
            .with_jitter(false);

        assert_eq!(config.backoff_duration(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_duration(40), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(400)
            .with_jitter(true);

        for _ in 0..20 {
            let backoff = config.backoff_duration(0);
            assert!(backoff >= Duration::from_millis(400));
            assert!(backoff <= Duration::from_millis(500));
        }
    }

    /// Service failure as seen by a test operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Failure {
        code: &'static str,
        status: Option<u16>,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} ({:?})", self.code, self.status)
        }
    }

    fn failure(code: &'static str, status: Option<u16>) -> Failure {
        Failure { code, status }
    }

    fn classify_failure(failure: &Failure) -> ErrorClassification {
        classify_response(Some(failure.code), failure.status)
    }

    #[test]
    fn test_classify_response() {
        assert_eq!(
            classify_response(Some("SlowDown"), Some(503)),
            ErrorClassification::Retryable
        );
        assert_eq!(
            classify_response(Some("InternalError"), None),
            ErrorClassification::Retryable
        );
        assert_eq!(classify_response(None, Some(429)), ErrorClassification::Retryable);
        assert_eq!(classify_response(None, Some(502)), ErrorClassification::Retryable);
        assert_eq!(
            classify_response(Some("NoSuchBucket"), Some(404)),
            ErrorClassification::NonRetryable
        );
        assert_eq!(
            classify_response(Some("AccessDenied"), Some(403)),
            ErrorClassification::NonRetryable
        );
        assert_eq!(classify_response(None, None), ErrorClassification::NonRetryable);
    }

    #[test]
    fn test_classify_sdk_error_by_variant() {
        let timeout = SdkError::<ListObjectsV2Error, HttpResponse>::timeout_error("timed out");
        assert_eq!(classify_sdk_error(&timeout), ErrorClassification::Retryable);

        let construction =
            SdkError::<ListObjectsV2Error, HttpResponse>::construction_failure("bad input");
        assert_eq!(
            classify_sdk_error(&construction),
            ErrorClassification::NonRetryable
        );
    }

    #[tokio::test]
    async fn test_access_denied_under_numeric_prefix_is_not_retried() {
        let config = RetryConfig::new()
            .with_max_retries(3)
            .with_initial_backoff_ms(1);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, Failure> =
            with_retry(&config, "list b/root/2500/", classify_failure, || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(failure("AccessDenied", Some(403))) }
            })
            .await;

        assert_eq!(result, Err(failure("AccessDenied", Some(403))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let config = RetryConfig::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, Failure> = with_retry(&config, "test_op", classify_failure, || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(failure("ServiceUnavailable", Some(503))) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let config = RetryConfig::new()
            .with_max_retries(3)
            .with_initial_backoff_ms(1)
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, Failure> = with_retry(&config, "test_op", classify_failure, || {
            let count = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(failure("RequestTimeout", Some(400)))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_backoff_ms(1)
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, Failure> = with_retry(&config, "test_op", classify_failure, || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(failure("SlowDown", None)) }
        })
        .await;

        assert_eq!(result, Err(failure("SlowDown", None)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let config = RetryConfig::new().with_max_retries(5);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, Failure> = with_retry(&config, "test_op", classify_failure, || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(failure("AccessDenied", Some(403))) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
