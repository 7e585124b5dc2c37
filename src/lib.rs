//! # Analytica - a composable analytics API client
//!
//! Analytica is a client library for remote analytics HTTP APIs, built on
//! top of `reqwest`. Its core is a decorator pipeline: a base HTTP-calling
//! client behind one common contract, wrapped transparently by independent
//! decorators for response caching, retry-with-delay, and result
//! post-processing, stackable in any order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use analytica::{AnalyticsClient, ApiClient, RequestParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), analytica::Error> {
//!     let client = ApiClient::builder()
//!         .endpoint("https://analytics.example.com/index.php")?
//!         .default_param("idSite", "1")
//!         .default_param("token_auth", "anonymous")
//!         .build()?;
//!
//!     let visits = client
//!         .request(
//!             RequestParams::from([("date", "today"), ("period", "day")]),
//!             Some("VisitsSummary.get"),
//!         )
//!         .await?;
//!
//!     println!("visits today: {visits}");
//!     Ok(())
//! }
//! ```
//!
//! ## Stacking decorators
//!
//! Every component implements [`AnalyticsClient`], so cross-cutting
//! concerns compose freely around the base client:
//!
//! ```no_run
//! use analytica::{
//!     AnalyticsClient, ApiClient, CachingClient, MemoryCache, ProcessingClient,
//!     RequestParams, RetryPolicy, RetryingClient,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), analytica::Error> {
//! let base = ApiClient::builder()
//!     .endpoint("https://analytics.example.com/index.php")?
//!     .build()?;
//!
//! // Retry around the cache around post-processing around HTTP.
//! let client = RetryingClient::new(
//!     CachingClient::new(
//!         ProcessingClient::new(base).with_processor(|mut result, _params| {
//!             if let Some(map) = result.as_object_mut() {
//!                 map.remove("metadata");
//!             }
//!             result
//!         }),
//!         MemoryCache::new(),
//!     ),
//!     RetryPolicy::new(3, Duration::from_secs(5)),
//! );
//!
//! let report = client
//!     .request(RequestParams::from([("idSite", "1")]), Some("VisitsSummary.get"))
//!     .await?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **One contract, many layers** - base client and decorators all
//!   implement [`AnalyticsClient`]; stacks compose in any order
//! - **Deterministic caching** - cache keys fingerprint the effective
//!   request, independent of parameter insertion order
//! - **Bounded retries** - fixed inter-attempt delay, typed-error
//!   branching; only API request failures are retried
//! - **Result pipelines** - ordered post-processing stages with access to
//!   the original request parameters
//! - **Context-rich errors** - every failure carries the endpoint and the
//!   parameter bag that produced it
//! - **Token-safe logging** - structured `tracing` events with the
//!   authentication token stripped from every parameter context
//!
//! ## Error Handling
//!
//! All request failures converge into [`RequestError`] at the base-client
//! boundary; decorators branch on the [`Error`] kind rather than on an
//! exception hierarchy:
//!
//! ```no_run
//! use analytica::{AnalyticsClient, ApiClient, Error, RequestParams};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = ApiClient::builder().endpoint("https://analytics.example.com/")?.build()?;
//! match client.request(RequestParams::from([("idSite", "1")]), None).await {
//!     Ok(result) => println!("success: {result}"),
//!     Err(Error::Request(err)) => {
//!         eprintln!("request to {:?} failed: {}", err.endpoint(), err);
//!         eprintln!("  parameters: {}", err.params());
//!     }
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
mod client;
mod error;
mod params;
pub mod processing;
pub mod retry;

pub use cache::{cache_key, CacheStore, CachingClient, MemoryCache};
pub use client::{AnalyticsClient, ApiClient, ApiClientBuilder, ApiResult};
pub use error::{Error, RequestError, Result};
pub use params::{RequestParams, TOKEN_AUTH};
pub use processing::{ProcessingClient, Processor};
pub use retry::{RetryPolicy, RetryingClient};
