use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use prodex_core::AppError;
use prodex_core::testutil::{MockCompletionClient, MockFetcher};

use crate::common::{PRODUCT_PAGE, body_json, json_post, raw_post, send, setup_test_app};

const REPLY: &str = r#"{"url":"u","title":"Acme Widget","pricing":{"current":19.99,"currency":"USD"}}"#;

fn default_app() -> crate::common::TestApp {
    setup_test_app(MockFetcher::new(PRODUCT_PAGE), MockCompletionClient::new(REPLY))
}

#[tokio::test]
async fn empty_body_returns_url_required() {
    let app = default_app();

    let response = send(app.router, json_post("/api/parse-product", "{}")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "URL is required"}));
    assert!(app.client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn url_is_checked_before_api_key() {
    let app = default_app();

    let response = send(
        app.router,
        json_post("/api/parse-product", r#"{"url":"","openaiApiKey":""}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "URL is required");
}

#[tokio::test]
async fn missing_api_key_returns_400() {
    let app = default_app();

    let response = send(
        app.router,
        json_post("/api/parse-product", r#"{"url":"https://shop.test/p/1"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "OpenAI API key is required"})
    );
}

#[tokio::test]
async fn body_without_json_content_type_reports_missing_url() {
    let app = default_app();

    let response = send(app.router, raw_post("/api/parse-product", None, "")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "URL is required"}));
    assert!(app.client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn form_encoded_body_reports_missing_url() {
    let app = default_app();

    let response = send(
        app.router,
        raw_post(
            "/api/parse-product",
            Some("application/x-www-form-urlencoded"),
            "url=https%3A%2F%2Fshop.test%2Fp%2F1",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "URL is required");
}

#[tokio::test]
async fn falsy_url_values_are_treated_as_missing() {
    for body in [
        r#"{"url":null,"openaiApiKey":"sk-test"}"#,
        r#"{"url":0,"openaiApiKey":"sk-test"}"#,
        r#"{"url":false,"openaiApiKey":"sk-test"}"#,
    ] {
        let app = default_app();

        let response = send(app.router, json_post("/api/parse-product", body)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await, json!({"error": "URL is required"}));
    }
}

#[tokio::test]
async fn falsy_api_key_is_treated_as_missing() {
    let app = default_app();

    let response = send(
        app.router,
        json_post(
            "/api/parse-product",
            r#"{"url":"https://shop.test/p/1","openaiApiKey":false}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "OpenAI API key is required"})
    );
}

#[tokio::test]
async fn non_string_url_reaches_the_pipeline_as_text() {
    let app = default_app();

    let response = send(
        app.router,
        json_post("/api/parse-product", r#"{"url":42,"openaiApiKey":"sk-test"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = app.client.calls.lock().unwrap();
    assert!(calls[0].0.contains("Original URL: 42\n"));
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = default_app();

    let response = send(app.router, json_post("/api/parse-product", "{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn happy_path_returns_exact_object() {
    let app = default_app();

    let response = send(
        app.router,
        json_post(
            "/api/parse-product",
            r#"{"url":"https://shop.test/p/1","openaiApiKey":"sk-test"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"url": "u", "title": "Acme Widget", "pricing": {"current": 19.99, "currency": "USD"}})
    );

    let calls = app.client.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "sk-test");
    assert!(calls[0].0.contains("Original URL: https://shop.test/p/1"));
    assert!(calls[0].0.contains("Product Content:\nAcme Widget \u{2014} $19.99\n"));
    assert!(!calls[0].0.contains("track()"));
}

#[tokio::test]
async fn fetch_failure_returns_500_with_stage_message() {
    let app = setup_test_app(
        MockFetcher::with_error(AppError::FetchError {
            url: "https://shop.test/gone".into(),
            message: "HTTP 404".into(),
            retryable: false,
        }),
        MockCompletionClient::new(REPLY),
    );

    let response = send(
        app.router,
        json_post(
            "/api/parse-product",
            r#"{"url":"https://shop.test/gone","openaiApiKey":"sk-test"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Failed to parse product",
            "message": "Failed to fetch HTML from https://shop.test/gone: HTTP 404"
        })
    );
}

#[tokio::test]
async fn model_failure_returns_500() {
    let app = setup_test_app(
        MockFetcher::new(PRODUCT_PAGE),
        MockCompletionClient::with_error(AppError::LlmError {
            message: "Incorrect API key provided".into(),
            status_code: 401,
            retryable: false,
        }),
    );

    let response = send(
        app.router,
        json_post(
            "/api/parse-product",
            r#"{"url":"https://shop.test/p/1","openaiApiKey":"bad"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["message"],
        "OpenAI API error: Incorrect API key provided"
    );
}

#[tokio::test]
async fn unparseable_reply_returns_500() {
    let app = setup_test_app(
        MockFetcher::new(PRODUCT_PAGE),
        MockCompletionClient::new("Sorry, I can't help with that."),
    );

    let response = send(
        app.router,
        json_post(
            "/api/parse-product",
            r#"{"url":"https://shop.test/p/1","openaiApiKey":"sk-test"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["message"],
        "Failed to parse structured data from the response"
    );
}

#[tokio::test]
async fn root_describes_the_service() {
    let app = default_app();

    let response = send(
        app.router,
        Request::get("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "message": "API to extract product info from product URLs using OpenAI",
            "environment": "test",
            "endpoints": {
                "parseProduct": "POST /api/parse-product",
                "document": "/api-docs"
            }
        })
    );
}

#[tokio::test]
async fn openapi_document_lists_parse_product() {
    let app = default_app();

    let response = send(
        app.router,
        Request::get("/openapi.json").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert_eq!(doc["info"]["title"], "Prodex API");
    assert!(doc["paths"]["/api/parse-product"]["post"].is_object());
    assert!(doc["components"]["schemas"]["ParseProductRequest"].is_object());
}
