use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parse product
// ---------------------------------------------------------------------------

/// Both fields are untyped at the wire level so that missing, empty or
/// falsy values can be reported with the service's own messages.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ParseProductRequest {
    /// URL of the product page to parse
    #[schema(value_type = Option<String>, example = "https://now-time.biz/products/issue-1-whirlpool?variant=42480670539836")]
    pub url: Option<serde_json::Value>,
    /// Your OpenAI API key; used for this request only
    #[serde(rename = "openaiApiKey")]
    #[schema(value_type = Option<String>, example = "sk-...")]
    pub openai_api_key: Option<serde_json::Value>,
}

/// Documented shape of a successful extraction. The model's object is
/// returned as produced, so extra or missing keys are possible.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub url: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub pricing: Option<PricingResponse>,
    /// Product variants/options as key-value pairs
    #[schema(value_type = Object)]
    pub attributes: Option<serde_json::Value>,
    pub description: Option<String>,
    /// Technical details as key-value pairs
    #[schema(value_type = Object)]
    pub specifications: Option<serde_json::Value>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PricingResponse {
    pub current: Option<f64>,
    pub original: Option<f64>,
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RootResponse {
    pub message: &'static str,
    pub environment: String,
    pub endpoints: EndpointsResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EndpointsResponse {
    #[serde(rename = "parseProduct")]
    pub parse_product: &'static str,
    pub document: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
