#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reelswap_fal::poller::PollConfig;
use reelswap_fal::{FalConfig, GenerationProvider};
use serde_json::Value;
use tower::ServiceExt;

use reelswap_api::config::ServerConfig;
use reelswap_api::router::build_app_router;
use reelswap_api::state::AppState;

pub use reelswap_fal::testing::MockProvider;

/// Build a test `ServerConfig` with safe defaults.
///
/// Poll mode, a `http://localhost:5173` CORS origin, a 30-second request
/// timeout and a fast poll loop.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        fal: FalConfig {
            key: Some("test-key".to_string()),
            ..FalConfig::default()
        },
        public_base_url: None,
        poll: PollConfig {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        },
    }
}

/// Same as [`test_config`] but with webhook delivery enabled.
pub fn push_config() -> ServerConfig {
    ServerConfig {
        public_base_url: Some("https://relay.example.com/".to_string()),
        ..test_config()
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// A router plus handles on the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<MockProvider>,
}

/// Build the full application router (same middleware stack as `main.rs`)
/// around a scripted provider.
pub fn build_test_app(config: ServerConfig, provider: MockProvider) -> TestApp {
    let provider = Arc::new(provider);
    let state = AppState::new(config.clone(), Arc::clone(&provider) as Arc<dyn GenerationProvider>);
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        provider,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    post_raw(app, uri, "application/json", body.to_string().into_bytes()).await
}

pub async fn post_raw(
    app: &Router,
    uri: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Read the whole response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a server-sent event body to its end and return each `data:` payload
/// parsed as JSON. Fails the test if the stream stays open for 5 seconds.
pub async fn sse_frames(response: Response<Body>) -> Vec<Value> {
    let collected = tokio::time::timeout(Duration::from_secs(5), response.into_body().collect())
        .await
        .expect("event stream did not end")
        .unwrap()
        .to_bytes();
    let text = String::from_utf8(collected.to_vec()).unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

/// One file part of a multipart form.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub const BOUNDARY: &str = "reelswap-test-boundary";

/// Encode `parts` as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Wait until `check` holds, polling every 10ms for up to 2 seconds.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
