//! Post-processing of analytics API results.
//!
//! [`ProcessingClient`] wraps any [`AnalyticsClient`] and pipes each raw
//! result through an ordered sequence of transformation functions before
//! returning it.

use async_trait::async_trait;

use crate::{
    client::{AnalyticsClient, ApiResult},
    params::RequestParams,
    Result,
};

/// A result transformation stage.
///
/// Receives the current result and the original caller parameters, returns
/// the new result. Stages run in registration order, each feeding the next.
pub type Processor = Box<dyn Fn(ApiResult, &RequestParams) -> ApiResult + Send + Sync>;

/// Decorator applying an ordered sequence of [`Processor`]s to every
/// result.
///
/// An empty sequence is a pass-through.
///
/// # Examples
///
/// ```no_run
/// use analytica::{AnalyticsClient, ApiClient, ProcessingClient, RequestParams};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), analytica::Error> {
/// let base = ApiClient::builder()
///     .endpoint("https://analytics.example.com/index.php")?
///     .build()?;
///
/// let client = ProcessingClient::new(base)
///     .with_processor(|mut result, _params| {
///         if let Some(map) = result.as_object_mut() {
///             map.remove("metadata");
///         }
///         result
///     });
///
/// let trimmed = client.request(RequestParams::from([("idSite", "1")]), None).await?;
/// # let _ = trimmed;
/// # Ok(())
/// # }
/// ```
pub struct ProcessingClient<C> {
    inner: C,
    processors: Vec<Processor>,
}

impl<C> ProcessingClient<C> {
    /// Wraps `inner` with an empty processor sequence.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            processors: Vec::new(),
        }
    }

    /// Replaces the whole processor sequence.
    pub fn set_processors(&mut self, processors: Vec<Processor>) {
        self.processors = processors;
    }

    /// Appends one processor to the sequence.
    pub fn add_processor(
        &mut self,
        processor: impl Fn(ApiResult, &RequestParams) -> ApiResult + Send + Sync + 'static,
    ) {
        self.processors.push(Box::new(processor));
    }

    /// Appends one processor, consuming and returning the decorator for
    /// construction chains.
    pub fn with_processor(
        mut self,
        processor: impl Fn(ApiResult, &RequestParams) -> ApiResult + Send + Sync + 'static,
    ) -> Self {
        self.add_processor(processor);
        self
    }

    /// The number of registered processors.
    pub fn processor_count(&self) -> usize {
        self.processors.len()
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
impl<C: AnalyticsClient> AnalyticsClient for ProcessingClient<C> {
    async fn request(&self, params: RequestParams, method: Option<&str>) -> Result<ApiResult> {
        let mut result = self.inner.request(params.clone(), method).await?;

        let context = params.sanitized();
        for (stage, processor) in self.processors.iter().enumerate() {
            // Closures carry no runtime name, so stages are identified by
            // their position in the sequence.
            tracing::debug!(stage, params = %context, "processing analytics API result");
            result = processor(result, &params);
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubClient {
        response: ApiResult,
    }

    #[async_trait]
    impl AnalyticsClient for StubClient {
        async fn request(
            &self,
            _params: RequestParams,
            _method: Option<&str>,
        ) -> Result<ApiResult> {
            Ok(self.response.clone())
        }
    }

    fn stub(response: ApiResult) -> StubClient {
        StubClient { response }
    }

    #[tokio::test]
    async fn test_empty_sequence_is_pass_through() {
        let client = ProcessingClient::new(stub(json!({"nb_visits": 42})));

        let result = client.request(RequestParams::new(), None).await.unwrap();

        assert_eq!(result, json!({"nb_visits": 42}));
        assert_eq!(client.processor_count(), 0);
    }

    #[tokio::test]
    async fn test_processors_run_in_registration_order() {
        let client = ProcessingClient::new(stub(json!({"trail": ""})))
            .with_processor(|mut result, _| {
                result["trail"] = json!(format!("{}f1", result["trail"].as_str().unwrap()));
                result
            })
            .with_processor(|mut result, _| {
                result["trail"] = json!(format!("{}.f2", result["trail"].as_str().unwrap()));
                result
            });

        let result = client.request(RequestParams::new(), None).await.unwrap();

        assert_eq!(result["trail"], json!("f1.f2"));
    }

    #[tokio::test]
    async fn test_every_stage_sees_original_params() {
        let client = ProcessingClient::new(stub(json!({})))
            .with_processor(|mut result, params| {
                result["site"] = json!(params.get("idSite").unwrap());
                result
            })
            .with_processor(|mut result, params| {
                result["date"] = json!(params.get("date").unwrap());
                result
            });

        let result = client
            .request(RequestParams::from([("idSite", "1"), ("date", "today")]), None)
            .await
            .unwrap();

        assert_eq!(result, json!({"site": "1", "date": "today"}));
    }

    #[tokio::test]
    async fn test_set_processors_replaces_sequence() {
        let mut client = ProcessingClient::new(stub(json!({"n": 1})));
        client.add_processor(|mut result, _| {
            result["n"] = json!(10);
            result
        });

        client.set_processors(vec![Box::new(|mut result: ApiResult, _: &RequestParams| {
            result["n"] = json!(20);
            result
        })]);

        let result = client.request(RequestParams::new(), None).await.unwrap();
        assert_eq!(result["n"], json!(20));
        assert_eq!(client.processor_count(), 1);
    }
}
