use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use prodex_client::HtmlReducer;
use prodex_core::ExtractionPipeline;
use prodex_core::testutil::{MockCompletionClient, MockFetcher};
use prodex_server::routes;
use prodex_server::state::AppState;

pub const PRODUCT_PAGE: &str = "<html><head><script>track()</script></head>\
<body><nav>Home</nav><main>Acme Widget \u{2014} $19.99</main></body></html>";

pub struct TestApp {
    pub router: Router,
    pub client: MockCompletionClient,
}

/// Router backed by the real HTML reducer, with the fetcher and model mocked.
pub fn setup_test_app(fetcher: MockFetcher, client: MockCompletionClient) -> TestApp {
    let pipeline = ExtractionPipeline::new(fetcher, HtmlReducer::new(), client.clone());
    let state = Arc::new(AppState::new(pipeline, "test"));

    TestApp {
        router: routes::router(state),
        client,
    }
}

pub fn json_post(uri: &str, body: &str) -> Request<Body> {
    raw_post(uri, Some("application/json"), body)
}

pub fn raw_post(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut request = Request::post(uri);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    request.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
