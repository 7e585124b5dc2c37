//! Example demonstrating a full decorator stack.
//!
//! This example shows how to:
//! - Wrap the base client with processing, caching, and retry decorators
//! - Serve a repeated request from the cache
//! - Post-process results before they reach the caller
//!
//! Run with: `cargo run --example decorator_stack`

use analytica::{
    AnalyticsClient, ApiClient, CachingClient, MemoryCache, ProcessingClient, RequestParams,
    RetryPolicy, RetryingClient,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), analytica::Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("analytica=debug,decorator_stack=info")
        .init();

    let base = ApiClient::builder()
        .endpoint("https://demo.matomo.cloud/index.php")?
        .default_param("idSite", "1")
        .default_param("token_auth", "anonymous")
        .build()?;

    // Innermost first: post-process, then cache, then retry.
    let client = RetryingClient::new(
        CachingClient::new(
            ProcessingClient::new(base).with_processor(|mut result, _params| {
                // Keep the demo output small.
                if let Some(map) = result.as_object_mut() {
                    map.retain(|key, _| key.starts_with("nb_"));
                }
                result
            }),
            MemoryCache::new(),
        ),
        RetryPolicy::new(3, Duration::from_secs(5)),
    );

    let params = RequestParams::from([("date", "yesterday"), ("period", "day")]);

    let first = client
        .request(params.clone(), Some("VisitsSummary.get"))
        .await?;
    println!("fetched: {first}");

    // Identical logical request: answered from the cache, no second HTTP
    // call, and the retry layer never engages.
    let second = client.request(params, Some("VisitsSummary.get")).await?;
    println!("cached:  {second}");

    Ok(())
}
