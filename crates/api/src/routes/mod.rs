pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /upload                          store image + video (POST, multipart)
/// /generate-from-urls              submit a generation job (POST)
/// /job-status/{request_id}         one-shot status query (GET)
/// /events/{request_id}             server-sent job events (GET)
/// /webhook                         provider push notifications (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handlers::upload::upload))
        .route(
            "/generate-from-urls",
            post(handlers::generation::generate_from_urls),
        )
        .route(
            "/job-status/{request_id}",
            get(handlers::generation::job_status),
        )
        .route("/events/{request_id}", get(sse::events_handler))
        .route("/webhook", post(handlers::webhook::receive))
}
