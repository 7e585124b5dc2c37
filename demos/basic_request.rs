//! Basic example demonstrating a simple analytics API request.
//!
//! This example shows how to:
//! - Build a base client with an endpoint and default parameters
//! - Issue a request with a per-call method override
//! - Inspect the decoded result
//!
//! Run with: `cargo run --example basic_request`

use analytica::{AnalyticsClient, ApiClient, RequestParams};

#[tokio::main]
async fn main() -> Result<(), analytica::Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("analytica=debug,basic_request=info")
        .init();

    // The public Matomo demo instance accepts anonymous requests.
    let client = ApiClient::builder()
        .endpoint("https://demo.matomo.cloud/index.php")?
        .default_param("idSite", "1")
        .default_param("token_auth", "anonymous")
        .build()?;

    let visits = client
        .request(
            RequestParams::from([("date", "yesterday"), ("period", "day")]),
            Some("VisitsSummary.get"),
        )
        .await?;

    println!("visits yesterday: {visits}");

    Ok(())
}
