//! Retrying failed requests with a fixed inter-attempt delay.
//!
//! [`RetryingClient`] wraps any [`AnalyticsClient`] and re-invokes it when
//! a request fails with a retryable error. Anything that is not an API
//! request failure (cache corruption, configuration mistakes) propagates
//! immediately, untouched.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    client::{AnalyticsClient, ApiResult},
    params::RequestParams,
    RequestError, Result,
};

/// How often and how patiently to retry.
///
/// Worst case, a request costs `max_attempts` inner calls and
/// `(max_attempts - 1) × wait` of delay; no delay follows the final failed
/// attempt.
///
/// # Examples
///
/// ```
/// use analytica::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(5));
/// assert_eq!(policy.max_attempts(), 3);
///
/// // At least one attempt is always made.
/// assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt bound and inter-attempt
    /// delay. `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    /// The maximum number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay between consecutive attempts.
    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl Default for RetryPolicy {
    /// Three attempts, five seconds apart.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Decorator re-invoking the inner client on retryable failures.
///
/// # Examples
///
/// ```no_run
/// use analytica::{AnalyticsClient, ApiClient, RequestParams, RetryPolicy, RetryingClient};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), analytica::Error> {
/// let base = ApiClient::builder()
///     .endpoint("https://analytics.example.com/index.php")?
///     .build()?;
/// let client = RetryingClient::new(base, RetryPolicy::new(3, Duration::from_secs(5)));
///
/// let result = client
///     .request(RequestParams::from([("idSite", "1")]), Some("VisitsSummary.get"))
///     .await?;
/// # let _ = result;
/// # Ok(())
/// # }
/// ```
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    /// Wraps `inner` with the given retry policy.
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The policy governing this decorator.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The wrapped client, mutably.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwraps the decorator, returning the inner client.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C: AnalyticsClient> AnalyticsClient for RetryingClient<C> {
    async fn request(&self, params: RequestParams, method: Option<&str>) -> Result<ApiResult> {
        let mut attempt = 1;

        while attempt <= self.policy.max_attempts {
            match self.inner.request(params.clone(), method).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() => {
                    if attempt < self.policy.max_attempts {
                        tracing::warn!(
                            wait_ms = self.policy.wait.as_millis(),
                            attempt,
                            error = %err,
                            "analytics API request failed, retrying after delay"
                        );
                        tokio::time::sleep(self.policy.wait).await;
                        attempt += 1;
                    } else {
                        tracing::error!(
                            attempts = self.policy.max_attempts,
                            error = %err,
                            "analytics API request failed, giving up"
                        );
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        // Unreachable by construction; kept so an exhausted loop can never
        // fall through silently.
        Err(RequestError::new("too many attempts to request the analytics API").into())
    }

    fn defaults(&self) -> RequestParams {
        self.inner.defaults()
    }

    fn set_defaults(&mut self, defaults: RequestParams) {
        self.inner.set_defaults(defaults);
    }

    fn merge_defaults(&mut self, defaults: RequestParams) {
        self.inner.merge_defaults(defaults);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Inner client stub failing a scripted number of times before
    /// succeeding.
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyClient {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalyticsClient for FlakyClient {
        async fn request(
            &self,
            _params: RequestParams,
            _method: Option<&str>,
        ) -> Result<ApiResult> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(RequestError::new("analytics API request failed").into());
            }
            Ok(json!({"result": "success"}))
        }
    }

    /// Inner client stub failing with a non-retryable error.
    struct CorruptClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalyticsClient for CorruptClient {
        async fn request(
            &self,
            _params: RequestParams,
            _method: Option<&str>,
        ) -> Result<ApiResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::CorruptCacheEntry { key: "abc".into() })
        }
    }

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_policy_clamps_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.wait(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_first_success_makes_one_attempt() {
        let client = RetryingClient::new(FlakyClient::failing(0), quick(5));

        let result = client.request(RequestParams::new(), None).await.unwrap();

        assert_eq!(result, json!({"result": "success"}));
        assert_eq!(client.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_recovers_within_attempt_budget() {
        let client = RetryingClient::new(FlakyClient::failing(2), quick(3));

        let result = client.request(RequestParams::new(), None).await.unwrap();

        assert_eq!(result, json!({"result": "success"}));
        assert_eq!(client.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_persistent_failure_makes_exactly_max_attempts() {
        let client = RetryingClient::new(FlakyClient::failing(usize::MAX), quick(3));

        let err = client.request(RequestParams::new(), None).await.unwrap_err();

        assert_eq!(client.inner().calls(), 3);
        // The last error is re-raised unchanged.
        match err {
            Error::Request(inner) => assert_eq!(inner.message(), "analytics API request failed"),
            other => panic!("expected Request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_propagates_immediately() {
        let client = RetryingClient::new(
            CorruptClient {
                calls: AtomicUsize::new(0),
            },
            quick(5),
        );

        let err = client.request(RequestParams::new(), None).await.unwrap_err();

        assert!(matches!(err, Error::CorruptCacheEntry { .. }));
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 1);
    }
}
