use std::future::Future;

use crate::error::AppError;
use crate::models::{ExtractionPrompt, SourceDocument};

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<SourceDocument, AppError>> + Send;
}

/// Reduces raw HTML to the normalized product text handed to the prompt.
pub trait Reducer: Send + Sync + Clone {
    fn reduce(&self, html: &str) -> Result<String, AppError>;
}

/// Sends an extraction prompt to an LLM and returns its raw textual reply.
pub trait CompletionClient: Send + Sync + Clone {
    /// `api_key` is supplied per call and must not be retained by the client.
    fn complete(
        &self,
        prompt: &ExtractionPrompt,
        api_key: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}
