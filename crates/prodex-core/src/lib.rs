pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod recover;
pub mod retry;
pub mod template;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::PipelineConfig;
pub use error::AppError;
pub use models::{ExtractionPrompt, Pricing, ProductRecord, SourceDocument};
pub use pipeline::{ExtractionPipeline, ReductionFailurePolicy};
pub use prompt::{MAX_CONTENT_LENGTH, PromptBuilder, TRUNCATION_MARKER};
pub use retry::RetryPolicy;
pub use template::{PromptTemplate, TemplateResolver};
pub use traits::{CompletionClient, Fetcher, Reducer};
