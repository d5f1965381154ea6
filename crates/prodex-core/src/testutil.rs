//! Test utilities: mock implementations of the pipeline traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{ExtractionPrompt, SourceDocument};
use crate::traits::{CompletionClient, Fetcher, Reducer};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML document.
    responses: Arc<Mutex<Vec<Result<SourceDocument, AppError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(SourceDocument {
            url: String::new(),
            html: html.to_string(),
        })])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<SourceDocument, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `fetch` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceDocument, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.is_empty() {
            Ok(SourceDocument {
                url: String::new(),
                html: "<html><body>default</body></html>".to_string(),
            })
        } else {
            responses.remove(0)
        };
        response.map(|doc| SourceDocument {
            url: url.to_string(),
            ..doc
        })
    }
}

// ---------------------------------------------------------------------------
// MockReducer
// ---------------------------------------------------------------------------

/// Mock reducer that returns its input or a configured error.
#[derive(Clone)]
pub struct MockReducer {
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockReducer {
    /// Creates a reducer that returns the input unchanged.
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a reducer whose first call fails.
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Reducer for MockReducer {
    fn reduce(&self, html: &str) -> Result<String, AppError> {
        let mut err = self.error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        Ok(html.to_string())
    }
}

// ---------------------------------------------------------------------------
// MockCompletionClient
// ---------------------------------------------------------------------------

/// Mock LLM client that returns queued replies and records every prompt.
#[derive(Clone)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// Recorded `(prompt, api_key)` pairs.
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    delay: Option<Duration>,
}

impl MockCompletionClient {
    pub fn new(reply: &str) -> Self {
        Self::with_responses(vec![Ok(reply.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl CompletionClient for MockCompletionClient {
    async fn complete(&self, prompt: &ExtractionPrompt, api_key: &str) -> Result<String, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.as_str().to_string(), api_key.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("{}".to_string())
        } else {
            responses.remove(0)
        }
    }
}
