//! Error types for analytics API calls.
//!
//! Every failure source at the base-client boundary (transport errors,
//! non-success statuses raised by the transport, JSON decode failures,
//! malformed bodies, API-reported logical errors) converges into a
//! [`RequestError`] carrying the endpoint and parameter bag active at
//! failure time. Decorators branch on the error kind: only
//! [`Error::Request`] triggers retry logic.

use http::StatusCode;
use url::Url;

use crate::params::RequestParams;

/// A failed analytics API request.
///
/// Carries the human-readable message, the endpoint and parameter bag in
/// effect when the failure happened, and the lower-level cause when one
/// exists.
///
/// # Examples
///
/// ```
/// use analytica::{RequestError, RequestParams};
/// use url::Url;
///
/// let endpoint = Url::parse("https://analytics.example.com/").unwrap();
/// let err = RequestError::new("analytics API request failed")
///     .with_endpoint(endpoint.clone())
///     .with_params(RequestParams::from([("idSite", "1")]));
///
/// assert_eq!(err.endpoint(), Some(&endpoint));
/// assert_eq!(err.params().get("idSite"), Some("1"));
/// ```
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct RequestError {
    message: String,
    endpoint: Option<Url>,
    params: RequestParams,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RequestError {
    /// Creates a new error with the given message and no context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            endpoint: None,
            params: RequestParams::new(),
            source: None,
        }
    }

    /// Attaches the endpoint that was being requested.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Attaches the parameter bag that was active at failure time.
    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    /// Attaches the lower-level cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The human-readable failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The endpoint that was being requested, if attached.
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// The parameter bag that was active at failure time.
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// The HTTP status reported by the transport cause, if one exists.
    pub fn status(&self) -> Option<StatusCode> {
        self.source
            .as_ref()?
            .downcast_ref::<reqwest::Error>()?
            .status()
    }
}

/// The main error type for analytics API calls.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The analytics API request failed.
    ///
    /// This is the only error kind retry decorators act on; see
    /// [`Error::is_retryable`].
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A cache hit produced a payload that is not object- or array-shaped.
    ///
    /// Defensive: indicates cache corruption or a foreign writer sharing the
    /// store. Never retried.
    #[error("corrupt cache entry under key {key}: expected a JSON object or array")]
    CorruptCacheEntry {
        /// The cache key whose payload was malformed.
        key: String,
    },

    /// Invalid client or decorator configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if this error may be resolved by retrying the request.
    ///
    /// Only [`Error::Request`] qualifies; corrupt cache entries and
    /// configuration mistakes will not improve on a second attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use analytica::{Error, RequestError};
    ///
    /// assert!(Error::from(RequestError::new("request failed")).is_retryable());
    /// assert!(!Error::Configuration("endpoint is required".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Request(_))
    }

    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Request(err) => err.status(),
            _ => None,
        }
    }
}

/// A specialized `Result` type for analytics API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_carries_context() {
        let endpoint = Url::parse("https://analytics.example.com/index.php").unwrap();
        let params = RequestParams::from([("idSite", "1"), ("date", "today")]);

        let err = RequestError::new("analytics API request failed")
            .with_endpoint(endpoint.clone())
            .with_params(params.clone());

        assert_eq!(err.message(), "analytics API request failed");
        assert_eq!(err.endpoint(), Some(&endpoint));
        assert_eq!(err.params(), &params);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_only_request_errors_are_retryable() {
        assert!(Error::from(RequestError::new("boom")).is_retryable());
        assert!(!Error::CorruptCacheEntry { key: "abc".into() }.is_retryable());
        assert!(!Error::Configuration("bad".into()).is_retryable());
        assert!(!Error::InvalidUrl(Url::parse("not a url").unwrap_err()).is_retryable());
    }

    #[test]
    fn test_source_chain_is_preserved() {
        let decode_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = RequestError::new("failed to decode the analytics API response")
            .with_source(decode_err);

        let source = std::error::Error::source(&err).expect("source should be attached");
        assert!(source.to_string().contains("expected"));
    }
}
