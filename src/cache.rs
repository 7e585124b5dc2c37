//! Response caching for analytics API requests.
//!
//! [`CachingClient`] wraps any [`AnalyticsClient`] and a [`CacheStore`],
//! answering repeated identical requests from the store instead of the
//! network. Cache keys are deterministic fingerprints of the effective
//! request, so two logically identical requests always share one entry no
//! matter the parameter insertion order.

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::{
    client::{AnalyticsClient, ApiResult},
    params::RequestParams,
    Error, Result,
};

/// The cache backend capability.
///
/// Values round-trip as opaque structured JSON. Implementations own their
/// concurrency guarantees; the caching decorator imposes no locking around
/// population, so two concurrent misses for one key may both fetch and
/// store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a value, returning `None` on miss.
    async fn get(&self, key: &str) -> Option<ApiResult>;

    /// Stores a value under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: ApiResult);

    /// Flushes pending writes to the backing medium.
    ///
    /// Returns `true` when everything was persisted. In-memory stores have
    /// nothing to flush and return `true` unconditionally.
    async fn persist(&self) -> bool;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> Option<ApiResult> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: ApiResult) {
        (**self).set(key, value).await;
    }

    async fn persist(&self) -> bool {
        (**self).persist().await
    }
}

/// A concurrent in-memory [`CacheStore`].
///
/// Entries live until the store is dropped; there is no eviction or TTL.
/// Wrap it in an [`Arc`] to share one store across several client stacks.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, ApiResult>,
}

impl MemoryCache {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<ApiResult> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: ApiResult) {
        self.entries.insert(key.to_string(), value);
    }

    async fn persist(&self) -> bool {
        true
    }
}

/// Derives the cache key for a request.
///
/// The key is the SHA-256 hex digest of the sorted URL-encoded parameter
/// bag concatenated with the method override (the empty string when
/// absent). [`RequestParams`] iterates sorted by key, so permutations of
/// the same logical request always hash identically, which is required
/// for cache effectiveness.
///
/// # Examples
///
/// ```
/// use analytica::{cache_key, RequestParams};
///
/// let a = RequestParams::from([("idSite", "1"), ("date", "today")]);
/// let b = RequestParams::from([("date", "today"), ("idSite", "1")]);
/// assert_eq!(cache_key(&a, None), cache_key(&b, None));
/// ```
pub fn cache_key(params: &RequestParams, method: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(params.to_query_string().as_bytes());
    hasher.update(method.unwrap_or("").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Decorator answering repeated identical requests from a [`CacheStore`].
///
/// # Examples
///
/// ```no_run
/// use analytica::{AnalyticsClient, ApiClient, CachingClient, MemoryCache, RequestParams};
///
/// # async fn example() -> Result<(), analytica::Error> {
/// let base = ApiClient::builder()
///     .endpoint("https://analytics.example.com/index.php")?
///     .build()?;
/// let client = CachingClient::new(base, MemoryCache::new());
///
/// let params = RequestParams::from([("idSite", "1"), ("date", "today")]);
/// let first = client.request(params.clone(), Some("VisitsSummary.get")).await?;
/// // Served from the cache, no second HTTP call.
/// let second = client.request(params, Some("VisitsSummary.get")).await?;
/// assert_eq!(first, second);
/// # Ok(())
/// # }
/// ```
pub struct CachingClient<C, S> {
    inner: C,
    store: S,
}

impl<C, S> CachingClient<C, S> {
    /// Wraps `inner` with the given cache store.
    pub fn new(inner: C, store: S) -> Self {
        Self { inner, store }
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

    /// The cache store backing this decorator.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<C, S> AnalyticsClient for CachingClient<C, S>
where
    C: AnalyticsClient,
    S: CacheStore,
{
    async fn request(&self, params: RequestParams, method: Option<&str>) -> Result<ApiResult> {
        // The key covers the effective request: inner defaults overlaid
        // with the caller's params.
        let mut lookup = self.inner.defaults();
        lookup.merge(params.clone());
        let key = cache_key(&lookup, method);

        if let Some(cached) = self.store.get(&key).await {
            tracing::info!(cache_key = %key, "analytics API response found in cache");
            if cached.is_object() || cached.is_array() {
                return Ok(cached);
            }
            return Err(Error::CorruptCacheEntry { key });
        }

        tracing::debug!(cache_key = %key, "analytics API response not cached, delegating to inner client");
        let result = self.inner.request(params, method).await?;

        self.store.set(&key, result.clone()).await;
        self.store.persist().await;
        tracing::info!(cache_key = %key, "analytics API response stored in cache");

        Ok(result)
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
