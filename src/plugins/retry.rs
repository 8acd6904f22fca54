//! Retry policy for transient failures.

use super::{Directive, Plugin};
use crate::metadata::RequestSpec;
use crate::Error;
use async_trait::async_trait;
use std::time::Duration;

/// How many times, and how patiently, a failed request is retried.
///
/// The wait before retry `k` (1-indexed) is `delay * backoff^(k-1)` when both
/// are set, `delay` when only the delay is set, and zero otherwise.
///
/// # Examples
///
/// ```
/// use simpler_agent::RetryPolicy;
/// use std::time::Duration;
///
/// // Three retries: 100ms, 200ms, 400ms
/// let policy = RetryPolicy::new(3)
///     .delay(Duration::from_millis(100))
///     .backoff(2.0);
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
///
/// // A bare count retries immediately
/// let immediate = RetryPolicy::from(4);
/// assert_eq!(immediate.delay_for_attempt(1), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RetryPolicy {
    /// The maximum number of retries after the first attempt.
    pub retries: usize,
    /// The base wait before a retry.
    pub delay: Option<Duration>,
    /// Multiplier applied to the delay for every further retry.
    pub backoff: Option<f64>,
}

impl RetryPolicy {
    /// Creates a policy retrying up to `retries` times without waiting.
    pub fn new(retries: usize) -> Self {
        Self {
            retries,
            delay: None,
            backoff: None,
        }
    }

    /// Sets the base wait between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the multiplier applied to the delay on every further retry.
    pub fn backoff(mut self, backoff: f64) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Returns the wait before the given retry.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry number (1-indexed, so 1 = first retry)
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let Some(delay) = self.delay else {
            return Duration::ZERO;
        };
        let Some(backoff) = self.backoff else {
            return delay;
        };

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = delay.as_secs_f64() * backoff.powi(exponent);
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl From<usize> for RetryPolicy {
    fn from(retries: usize) -> Self {
        Self::new(retries)
    }
}

/// Retries 5xx responses, connection failures and aborted attempts.
///
/// 4xx and 3xx responses are never retried. The attempt counter lives as
/// long as one logical request.
#[derive(Debug, Clone)]
pub struct RetryPlugin {
    policy: RetryPolicy,
    attempts: usize,
}

impl RetryPlugin {
    /// Creates a plugin enforcing `policy`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Number of retries granted so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

#[async_trait]
impl Plugin for RetryPlugin {
    async fn on_error(&mut self, req: &mut RequestSpec, err: &Error) -> Directive {
        if !err.is_retryable() || self.attempts >= self.policy.retries {
            return Directive::Proceed;
        }

        self.attempts += 1;
        let delay = self.policy.delay_for_attempt(self.attempts);
        tracing::info!(
            delay_ms = delay.as_millis(),
            attempt = self.attempts,
            retries = self.policy.retries,
            method = %req.method(),
            path = %req.path(),
            "Retrying request after delay"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Directive::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorContext, Response};
    use http::{HeaderMap, Method, StatusCode};

    fn context() -> ErrorContext {
        ErrorContext {
            method: Method::GET,
            host: "h.test".to_string(),
            path: "/".to_string(),
        }
    }

    fn status_error(status: u16) -> Error {
        Error::Response {
            context: context(),
            response: Box::new(Response::new(
                StatusCode::from_u16(status).unwrap(),
                HeaderMap::new(),
                String::new(),
                Duration::ZERO,
                1,
            )),
        }
    }

    #[test]
    fn test_backoff_delays() {
        let policy = RetryPolicy::new(3)
            .delay(Duration::from_millis(100))
            .backoff(2.0);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_constant_delays() {
        let policy = RetryPolicy::new(3).delay(Duration::from_secs(1));

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_without_delay_is_immediate() {
        let policy = RetryPolicy::new(3).backoff(2.0);
        assert_eq!(policy.delay_for_attempt(2), Duration::ZERO);
    }

    #[test]
    fn test_huge_backoff_saturates() {
        let policy = RetryPolicy::new(3)
            .delay(Duration::from_secs(1))
            .backoff(f64::MAX);
        assert_eq!(policy.delay_for_attempt(3), Duration::MAX);
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_exhausted() {
        let mut plugin = RetryPlugin::new(RetryPolicy::from(2));
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();

        assert_eq!(plugin.on_error(&mut spec, &status_error(500)).await, Directive::Retry);
        assert_eq!(plugin.on_error(&mut spec, &status_error(503)).await, Directive::Retry);
        assert_eq!(plugin.on_error(&mut spec, &status_error(500)).await, Directive::Proceed);
        assert_eq!(plugin.attempts(), 2);
    }

    #[tokio::test]
    async fn test_retries_failures_without_status() {
        let mut plugin = RetryPlugin::new(RetryPolicy::from(1));
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();
        let err = Error::Abort { context: context() };

        assert_eq!(plugin.on_error(&mut spec, &err).await, Directive::Retry);
    }

    #[tokio::test]
    async fn test_never_retries_client_errors() {
        let mut plugin = RetryPlugin::new(RetryPolicy::from(5));
        let mut spec = RequestSpec::new(Method::GET, "http://h.test/").unwrap();

        assert_eq!(plugin.on_error(&mut spec, &status_error(404)).await, Directive::Proceed);
        assert_eq!(plugin.on_error(&mut spec, &status_error(301)).await, Directive::Proceed);
        assert_eq!(plugin.attempts(), 0);
    }
}
