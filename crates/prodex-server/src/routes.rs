use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use prodex_core::AppError;

use crate::dto::{EndpointsResponse, ParseProductRequest, RootResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Request bodies carry two short strings; anything larger is rejected.
const MAX_BODY_BYTES: usize = 100 * 1024;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new().route("/api/parse-product", post(parse_product));

    Router::new()
        .route("/", get(root))
        .merge(api)
        .merge(SwaggerUi::new("/api-docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/parse-product",
    request_body = ParseProductRequest,
    responses(
        (status = 200, description = "Successfully extracted product data", body = crate::dto::ProductResponse),
        (status = 400, description = "Invalid input parameters", body = crate::dto::ErrorResponse),
        (status = 500, description = "Extraction failed", body = crate::dto::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn parse_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ParseProductRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        // No JSON body at all: report the missing fields rather than the media type.
        Err(JsonRejection::MissingJsonContentType(_)) => ParseProductRequest::default(),
        Err(e) => return Err(AppError::InvalidRequest(e.body_text()).into()),
    };

    let Some(url) = field_text(body.url) else {
        tracing::error!("Request missing URL parameter");
        return Err(AppError::InvalidRequest("URL is required".to_string()).into());
    };
    tracing::info!(%url, "Received request to parse product");

    let Some(api_key) = field_text(body.openai_api_key) else {
        tracing::error!("Request missing OpenAI API key parameter");
        return Err(AppError::InvalidRequest("OpenAI API key is required".to_string()).into());
    };

    let product = state.extractor.extract_product(&url, &api_key).await?;
    tracing::info!("Successfully parsed product data");

    Ok(Json(product))
}

/// Text of a request field, or `None` when it is absent or falsy
/// (`null`, `false`, `0`, `""`). Other non-string values are stringified.
fn field_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service description", body = RootResponse),
    ),
    tag = "system"
)]
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "API to extract product info from product URLs using OpenAI",
        environment: state.environment.clone(),
        endpoints: EndpointsResponse {
            parse_product: "POST /api/parse-product",
            document: "/api-docs",
        },
    })
}
