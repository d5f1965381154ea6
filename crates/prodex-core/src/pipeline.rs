use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::error::AppError;
use crate::models::{ProductRecord, SourceDocument};
use crate::prompt::PromptBuilder;
use crate::recover::recover;
use crate::retry::RetryPolicy;
use crate::traits::{CompletionClient, Fetcher, Reducer};

/// What the pipeline does when HTML reduction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionFailurePolicy {
    /// Surface the failure to the caller.
    #[default]
    Abort,
    /// Log the failure and prompt the model with empty content.
    ProceedEmpty,
}

impl FromStr for ReductionFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "proceed" | "proceed_empty" => Ok(Self::ProceedEmpty),
            other => Err(format!("unknown policy '{other}' (expected abort or proceed)")),
        }
    }
}

/// Orchestrates the extraction pipeline: fetch → reduce → prompt → complete → recover.
///
/// Generic over its I/O collaborators so tests can run it without network
/// access. Holds no per-request state; one instance serves concurrent calls.
pub struct ExtractionPipeline<F, R, C>
where
    F: Fetcher,
    R: Reducer,
    C: CompletionClient,
{
    fetcher: F,
    reducer: R,
    client: C,
    prompt_builder: PromptBuilder,
    fetch_policy: RetryPolicy,
    completion_policy: RetryPolicy,
    on_reduction_failure: ReductionFailurePolicy,
    normalize_output: bool,
}

impl<F, R, C> ExtractionPipeline<F, R, C>
where
    F: Fetcher,
    R: Reducer,
    C: CompletionClient,
{
    /// Create a pipeline with the built-in template and single-attempt policies.
    pub fn new(fetcher: F, reducer: R, client: C) -> Self {
        Self {
            fetcher,
            reducer,
            client,
            prompt_builder: PromptBuilder::default(),
            fetch_policy: RetryPolicy::default(),
            completion_policy: RetryPolicy::default(),
            on_reduction_failure: ReductionFailurePolicy::Abort,
            normalize_output: false,
        }
    }

    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    pub fn with_fetch_policy(mut self, policy: RetryPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    pub fn with_completion_policy(mut self, policy: RetryPolicy) -> Self {
        self.completion_policy = policy;
        self
    }

    pub fn with_reduction_failure_policy(mut self, policy: ReductionFailurePolicy) -> Self {
        self.on_reduction_failure = policy;
        self
    }

    /// Coerce results into the [`ProductRecord`] shape before returning them.
    pub fn normalize_output(mut self, enabled: bool) -> Self {
        self.normalize_output = enabled;
        self
    }

    /// Run the full pipeline for one product URL.
    ///
    /// 1. Fetch HTML from URL
    /// 2. Reduce HTML to normalized text
    /// 3. Render the prompt with a bounded excerpt
    /// 4. Ask the model
    /// 5. Recover the JSON object from the reply
    /// 6. Optionally normalize into the product shape
    pub async fn extract(&self, url: &str, api_key: &str) -> Result<Value, AppError> {
        tracing::info!(%url, "Starting product data extraction");

        // 1. Fetch
        let document = self.fetch(url).await?;
        tracing::debug!("Fetched {} bytes of HTML", document.html.len());

        // 2. Reduce
        let content = self.reduce(&document)?;

        // 3. Prompt
        let prompt = self.prompt_builder.build(url, &content);
        tracing::debug!(
            template = self.prompt_builder.template().name(),
            prompt_len = prompt.as_str().len(),
            "Prepared extraction prompt"
        );

        // 4. Complete
        tracing::info!(%url, "Calling LLM to extract product data");
        let reply = self
            .completion_policy
            .run(
                || self.client.complete(&prompt, api_key),
                |limit| AppError::LlmError {
                    message: format!("request timed out after {}", format_duration(limit)),
                    status_code: 0,
                    retryable: true,
                },
            )
            .await?;
        tracing::debug!(reply_len = reply.len(), "Received model reply, parsing JSON");

        // 5. Recover
        let extracted = recover(&reply)?;

        // 6. Normalize
        let extracted = if self.normalize_output {
            let mut record = ProductRecord::from_value(&extracted)?;
            record.url.get_or_insert_with(|| url.to_string());
            serde_json::to_value(record)?
        } else {
            extracted
        };

        tracing::info!(%url, "Product data extraction completed");
        Ok(extracted)
    }

    /// Fetch and reduce only; no model call.
    pub async fn reduce_url(&self, url: &str) -> Result<String, AppError> {
        let document = self.fetch(url).await?;
        self.reduce(&document)
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt_builder
    }

    async fn fetch(&self, url: &str) -> Result<SourceDocument, AppError> {
        tracing::debug!(%url, "Fetching HTML");
        self.fetch_policy
            .run(
                || self.fetcher.fetch(url),
                |limit| AppError::FetchError {
                    url: url.to_string(),
                    message: format!("request timed out after {}", format_duration(limit)),
                    retryable: true,
                },
            )
            .await
    }

    fn reduce(&self, document: &SourceDocument) -> Result<String, AppError> {
        match self.reducer.reduce(&document.html) {
            Ok(content) => {
                tracing::debug!(
                    "Reduced {} bytes of HTML to {} characters of text",
                    document.html.len(),
                    content.chars().count()
                );
                Ok(content)
            }
            Err(err) => match self.on_reduction_failure {
                ReductionFailurePolicy::Abort => Err(err),
                ReductionFailurePolicy::ProceedEmpty => {
                    tracing::warn!(url = %document.url, error = %err, "Reduction failed, continuing with empty content");
                    Ok(String::new())
                }
            },
        }
    }
}

fn format_duration(limit: Duration) -> String {
    if limit.subsec_millis() == 0 {
        format!("{} seconds", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}
