use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use prodex_core::{AppError, CompletionClient, ExtractionPipeline, Fetcher, Reducer};
use serde_json::Value;

/// Object-safe view of the extraction pipeline, so handlers stay non-generic.
pub trait ProductExtractor: Send + Sync {
    fn extract_product<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Value, AppError>> + Send + 'a>>;
}

impl<F, R, C> ProductExtractor for ExtractionPipeline<F, R, C>
where
    F: Fetcher,
    R: Reducer,
    C: CompletionClient,
{
    fn extract_product<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Value, AppError>> + Send + 'a>> {
        Box::pin(self.extract(url, api_key))
    }
}

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub extractor: Arc<dyn ProductExtractor>,
    /// Deployment name reported by the root endpoint.
    pub environment: String,
}

impl AppState {
    pub fn new(extractor: impl ProductExtractor + 'static, environment: impl Into<String>) -> Self {
        Self {
            extractor: Arc::new(extractor),
            environment: environment.into(),
        }
    }
}
