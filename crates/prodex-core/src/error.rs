use thiserror::Error;

/// Application-wide error types for Prodex.
///
/// Each pipeline stage has its own variant so that the message surfaced to
/// callers identifies where the extraction stopped.
#[derive(Error, Debug)]
pub enum AppError {
    /// Retrieving the product page failed (invalid URL, DNS, timeout, non-2xx, ...).
    #[error("Failed to fetch HTML from {url}: {message}")]
    FetchError {
        url: String,
        message: String,
        retryable: bool,
    },

    /// The HTML could not be reduced to text.
    #[error("Failed to process HTML content: {0}")]
    ReductionError(String),

    /// LLM API call failed. `status_code` is 0 when no HTTP response was received.
    #[error("OpenAI API error: {message}")]
    LlmError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// The model reply did not contain parseable JSON.
    #[error("Failed to parse structured data from the response")]
    RecoveryError { raw: String },

    /// Recovered JSON could not be coerced into the product shape.
    #[error("Extracted data does not match the product shape: {0}")]
    SchemaValidationError(String),

    /// The caller supplied an incomplete or malformed request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::FetchError { retryable, .. } | AppError::LlmError { retryable, .. } => {
                *retryable
            }
            _ => false,
        }
    }
}
