//! The client contract and the base HTTP-calling client.
//!
//! [`AnalyticsClient`] is the contract every component in a request
//! pipeline satisfies: the base [`ApiClient`] as well as the caching,
//! retrying, and processing decorators that wrap it. Use
//! [`ApiClientBuilder`] to configure and create base clients.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::{params::RequestParams, Error, RequestError, Result};

/// A decoded analytics API response.
///
/// The API does not fix the response shape beyond "JSON object or array",
/// so results are exposed as raw [`serde_json::Value`]s; callers must
/// defensively check for the fields they need. The base client guarantees
/// the value is never scalar-shaped.
pub type ApiResult = Value;

/// The common contract of the request pipeline.
///
/// Implemented by the base [`ApiClient`] and by every decorator, so stacks
/// can be composed in any order:
///
/// ```no_run
/// use analytica::{ApiClient, CachingClient, MemoryCache, ProcessingClient, RetryingClient, RetryPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), analytica::Error> {
/// let base = ApiClient::builder()
///     .endpoint("https://analytics.example.com/index.php")?
///     .build()?;
///
/// let client = RetryingClient::new(
///     CachingClient::new(
///         ProcessingClient::new(base),
///         MemoryCache::new(),
///     ),
///     RetryPolicy::new(3, Duration::from_secs(5)),
/// );
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
///
/// The defaults trio has provided implementations so that clients without
/// default-parameter storage satisfy the contract as no-ops: reads yield an
/// empty bag, writes are dropped. Decorators override all three by
/// forwarding to their inner client, so a defaults call anywhere on a stack
/// reaches the base client.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Sends a request to the analytics API.
    ///
    /// `method` optionally overrides the API method for this single call; a
    /// `Some("")` override is indistinguishable from `None`.
    async fn request(&self, params: RequestParams, method: Option<&str>) -> Result<ApiResult>;

    /// The default parameters applied to every request.
    fn defaults(&self) -> RequestParams {
        RequestParams::new()
    }

    /// Replaces the default parameters.
    fn set_defaults(&mut self, _defaults: RequestParams) {}

    /// Merges new parameters into the existing defaults; new values win on
    /// key collision.
    fn merge_defaults(&mut self, _defaults: RequestParams) {}
}

/// Placeholder message for API-reported errors without a `message` field.
const NO_MESSAGE: &str = "(no message)";

fn seeded_defaults() -> RequestParams {
    RequestParams::from([("module", "API"), ("format", "JSON")])
}

/// The base client: merges defaults, issues one HTTP GET, decodes and
/// validates the JSON body.
///
/// # Examples
///
/// ```no_run
/// use analytica::{AnalyticsClient, ApiClient, RequestParams};
///
/// # async fn example() -> Result<(), analytica::Error> {
/// let client = ApiClient::builder()
///     .endpoint("https://analytics.example.com/index.php")?
///     .default_param("idSite", "1")
///     .default_param("token_auth", "anonymous")
///     .build()?;
///
/// let visits = client
///     .request(
///         RequestParams::from([("date", "today"), ("period", "day")]),
///         Some("VisitsSummary.get"),
///     )
///     .await?;
/// println!("visits today: {visits}");
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    http_client: reqwest::Client,
    endpoint: Url,
    defaults: RequestParams,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Creates a new [`ApiClientBuilder`] for configuring a base client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// The API endpoint URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Replaces the API endpoint URL.
    pub fn set_endpoint(&mut self, endpoint: Url) {
        self.endpoint = endpoint;
    }

    /// The effective parameters for one call: stored defaults overlaid with
    /// caller params, then with the method override when present and
    /// non-empty. Later sources win per key.
    fn effective_params(&self, params: RequestParams, method: Option<&str>) -> RequestParams {
        let mut merged = self.defaults.clone();
        merged.merge(params);
        if let Some(method) = method.filter(|m| !m.is_empty()) {
            merged.insert("method", method);
        }
        merged
    }

    fn request_failed(&self, params: &RequestParams, source: reqwest::Error) -> Error {
        RequestError::new("analytics API request failed")
            .with_endpoint(self.endpoint.clone())
            .with_params(params.clone())
            .with_source(source)
            .into()
    }
}

#[async_trait]
impl AnalyticsClient for ApiClient {
    async fn request(&self, params: RequestParams, method: Option<&str>) -> Result<ApiResult> {
        let merged = self.effective_params(params, method);
        let context = merged.sanitized();

        tracing::debug!(params = %context, "requesting analytics API");

        let mut url = self.endpoint.clone();
        url.set_query(Some(&merged.to_query_string()));

        let mut request = self.http_client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.request_failed(&merged, e))?;

        tracing::debug!(params = %context, "decoding analytics API response");

        let body = response
            .text()
            .await
            .map_err(|e| self.request_failed(&merged, e))?;

        let result: Value = serde_json::from_str(&body).map_err(|e| {
            RequestError::new("failed to decode the analytics API response")
                .with_endpoint(self.endpoint.clone())
                .with_params(merged.clone())
                .with_source(e)
        })?;

        if !result.is_object() && !result.is_array() {
            return Err(RequestError::new(
                "expected the analytics API response to be a JSON object or array",
            )
            .with_endpoint(self.endpoint.clone())
            .with_params(merged)
            .into());
        }

        // An HTTP 200 can still carry an API-level failure in the body.
        if result.get("result").and_then(Value::as_str) == Some("error") {
            let message = result
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(NO_MESSAGE);
            return Err(RequestError::new(message)
                .with_endpoint(self.endpoint.clone())
                .with_params(merged)
                .into());
        }

        Ok(result)
    }

    fn defaults(&self) -> RequestParams {
        self.defaults.clone()
    }

    fn set_defaults(&mut self, defaults: RequestParams) {
        self.defaults = defaults;
    }

    fn merge_defaults(&mut self, defaults: RequestParams) {
        self.defaults.merge(defaults);
    }
}

/// Builder for configuring and creating an [`ApiClient`].
///
/// Defaults start from the two seeded entries every analytics request
/// carries (`module=API`, `format=JSON`); builder-supplied defaults are
/// merged over the seeds.
pub struct ApiClientBuilder {
    endpoint: Option<Url>,
    defaults: RequestParams,
    timeout: Option<Duration>,
    http_client: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    /// Creates a new builder with seeded defaults and no endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            defaults: seeded_defaults(),
            timeout: None,
            http_client: None,
        }
    }

    /// Sets the API endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn endpoint(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.endpoint = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Merges the given parameters into the default parameters.
    pub fn defaults(mut self, defaults: RequestParams) -> Self {
        self.defaults.merge(defaults);
        self
    }

    /// Adds one default parameter.
    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Sets the per-request transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Injects a preconfigured HTTP client instead of the built-in one.
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Builds the configured [`ApiClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint was provided or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::Configuration("endpoint is required".to_string()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::Configuration(format!("failed to build HTTP client: {e}"))
            })?,
        };

        Ok(ApiClient {
            http_client,
            endpoint,
            defaults: self.defaults,
            timeout: self.timeout,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ApiClient {
        ApiClient::builder()
            .endpoint("https://analytics.example.com/index.php")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_seeds_module_and_format() {
        let client = test_client();
        let defaults = client.defaults();

        assert_eq!(defaults.get("module"), Some("API"));
        assert_eq!(defaults.get("format"), Some("JSON"));
    }

    #[test]
    fn test_builder_defaults_merge_over_seeds() {
        let client = ApiClient::builder()
            .endpoint("https://analytics.example.com/index.php")
            .unwrap()
            .defaults(RequestParams::from([("format", "JSON2"), ("idSite", "7")]))
            .build()
            .unwrap();
        let defaults = client.defaults();

        assert_eq!(defaults.get("module"), Some("API"));
        assert_eq!(defaults.get("format"), Some("JSON2"));
        assert_eq!(defaults.get("idSite"), Some("7"));
    }

    #[test]
    fn test_builder_requires_endpoint() {
        let result = ApiClient::builder().build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_effective_params_merge_order() {
        let mut client = test_client();
        client.merge_defaults(RequestParams::from([("idSite", "1"), ("period", "day")]));

        let merged = client.effective_params(
            RequestParams::from([("period", "week"), ("date", "today")]),
            Some("VisitsSummary.get"),
        );

        // Caller params win over defaults, method override wins last.
        assert_eq!(merged.get("module"), Some("API"));
        assert_eq!(merged.get("period"), Some("week"));
        assert_eq!(merged.get("date"), Some("today"));
        assert_eq!(merged.get("method"), Some("VisitsSummary.get"));
    }

    #[test]
    fn test_empty_method_override_is_dropped() {
        let client = test_client();

        let merged = client.effective_params(RequestParams::new(), Some(""));
        assert!(!merged.contains("method"));

        let merged = client.effective_params(RequestParams::new(), None);
        assert!(!merged.contains("method"));
    }

    #[test]
    fn test_set_defaults_replaces_everything() {
        let mut client = test_client();
        client.set_defaults(RequestParams::from([("idSite", "9")]));

        let defaults = client.defaults();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.get("idSite"), Some("9"));
        assert!(!defaults.contains("module"));
    }

    #[test]
    fn test_set_endpoint_replaces_target() {
        let mut client = test_client();
        let replacement = Url::parse("https://stats.example.org/").unwrap();
        client.set_endpoint(replacement.clone());
        assert_eq!(client.endpoint(), &replacement);
    }
}
