//! Recovery of the JSON object embedded in a model reply.
//!
//! Models often wrap the requested object in prose ("Here is the data: ...").
//! The candidate is the span from the first `{` to the last `}`; when no such
//! span exists the whole trimmed reply is parsed instead.

use serde_json::Value;

use crate::error::AppError;

/// Locate the JSON candidate inside `reply`.
pub fn json_candidate(reply: &str) -> &str {
    let trimmed = reply.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse the JSON embedded in `reply`. A single attempt; the reply is never
/// sent back to the model.
pub fn recover(reply: &str) -> Result<Value, AppError> {
    let candidate = json_candidate(reply);
    serde_json::from_str(candidate).map_err(|e| {
        tracing::warn!(error = %e, reply_len = reply.len(), "Model reply is not valid JSON");
        tracing::debug!(raw = %reply, "Unparseable model reply");
        AppError::RecoveryError {
            raw: reply.to_string(),
        }
    })
}
