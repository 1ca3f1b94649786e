//! Integration tests for the `/api/events/{request_id}` event stream.

mod common;

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use common::{
    build_test_app, eventually, get, post_json, push_config, sse_frames, test_config,
    MockProvider,
};
use reelswap_core::error::CoreError;
use reelswap_core::job::{JobEvent, VideoOutput};
use reelswap_fal::poller::PollConfig;
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: push mode relays webhook notifications and closes on completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_mode_stream_relays_webhooks_until_terminal() {
    let app = build_test_app(push_config(), MockProvider::configured());

    let response = get(&app.router, "/api/events/abc123").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert!(app.state.registry.is_subscribed("abc123").await);

    for notification in [
        json!({"request_id": "abc123", "status": "IN_QUEUE"}),
        json!({"request_id": "abc123", "status": "IN_PROGRESS"}),
        json!({"request_id": "abc123", "status": "OK", "payload": {"video": {"url": "https://cdn.test/out.mp4"}}}),
    ] {
        post_json(&app.router, "/api/webhook", notification).await;
    }

    let frames = sse_frames(response).await;
    assert_eq!(
        frames,
        vec![
            json!({"status": "CONNECTED"}),
            json!({"state": "QUEUED"}),
            json!({"state": "IN_PROGRESS"}),
            json!({"state": "COMPLETED", "video": {"url": "https://cdn.test/out.mp4"}}),
        ]
    );
    assert!(!app.state.registry.is_subscribed("abc123").await);
    assert_eq!(app.provider.network_calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: duplicate completion after teardown is not delivered
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_completion_is_a_no_op() {
    let app = build_test_app(push_config(), MockProvider::configured());
    let response = get(&app.router, "/api/events/dup").await;

    let failed = json!({"request_id": "dup", "status": "ERROR", "error": "out of memory"});
    let first = common::body_json(post_json(&app.router, "/api/webhook", failed.clone()).await).await;
    let second = common::body_json(post_json(&app.router, "/api/webhook", failed).await).await;

    assert_eq!(first["delivered"], true);
    assert_eq!(second["delivered"], false);

    let frames = sse_frames(response).await;
    assert_eq!(
        frames.last(),
        Some(&json!({"state": "FAILED", "error": "out of memory"}))
    );
    assert_eq!(frames.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: a second subscriber replaces the first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_subscriber_replaces_first() {
    let app = build_test_app(push_config(), MockProvider::configured());

    let first = get(&app.router, "/api/events/shared").await;
    let second = get(&app.router, "/api/events/shared").await;

    // The replaced stream ends after its CONNECTED frame.
    assert_eq!(sse_frames(first).await, vec![json!({"status": "CONNECTED"})]);

    // Its late cleanup must not remove the new subscription.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.state.registry.is_subscribed("shared").await);

    post_json(
        &app.router,
        "/api/webhook",
        json!({"request_id": "shared", "status": "FAILED"}),
    )
    .await;

    assert_eq!(
        sse_frames(second).await,
        vec![
            json!({"status": "CONNECTED"}),
            json!({"state": "FAILED", "error": "Job failed"}),
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: poll mode streams polled states without a webhook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_mode_stream_polls_until_terminal() {
    let provider = MockProvider::with_statuses(vec![
        Ok(JobEvent::queued()),
        Err(CoreError::Upstream("blip".into())),
        Ok(JobEvent::in_progress().with_logs(Some(json!(["step 1"])))),
        Ok(JobEvent::completed(VideoOutput::from_url("https://cdn.test/out.mp4"))),
    ]);
    let app = build_test_app(test_config(), provider);

    let response = get(&app.router, "/api/events/job-9").await;
    let frames = sse_frames(response).await;

    // Failed queries are skipped; logs are not pushed to the stream.
    assert_eq!(
        frames,
        vec![
            json!({"status": "CONNECTED"}),
            json!({"state": "QUEUED"}),
            json!({"state": "IN_PROGRESS"}),
            json!({"state": "COMPLETED", "video": {"url": "https://cdn.test/out.mp4"}}),
        ]
    );

    let pollers = std::sync::Arc::clone(&app.state.pollers);
    assert!(eventually(move || {
        let pollers = std::sync::Arc::clone(&pollers);
        async move { pollers.active_count() == 0 }
    })
    .await);
}

// ---------------------------------------------------------------------------
// Test: an exhausted poll budget ends the stream with FAILED
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_mode_timeout_becomes_failed_frame() {
    let mut config = test_config();
    config.poll = PollConfig {
        interval: Duration::from_millis(5),
        max_attempts: 3,
    };
    let app = build_test_app(config, MockProvider::configured());

    let frames = sse_frames(get(&app.router, "/api/events/slow").await).await;

    assert_eq!(frames.len(), 5);
    assert_eq!(frames[1], json!({"state": "IN_PROGRESS"}));
    assert_eq!(
        frames[4],
        json!({"state": "FAILED", "error": "Timed out after 3 status queries"})
    );
    assert_eq!(
        app.provider
            .status_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

// ---------------------------------------------------------------------------
// Test: poll mode without a credential fails the stream at once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_mode_without_credential_fails_stream() {
    let app = build_test_app(test_config(), MockProvider::unconfigured());

    let frames = sse_frames(get(&app.router, "/api/events/nokey").await).await;

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["state"], "FAILED");
    assert_eq!(
        frames[1]["error"],
        "Configuration error: FAL_KEY not configured on server"
    );
}

// ---------------------------------------------------------------------------
// Test: closing the stream removes the subscription and stops polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_cleans_up_subscription_and_poller() {
    let mut config = test_config();
    config.poll = PollConfig {
        interval: Duration::from_secs(3600),
        max_attempts: 10,
    };
    let app = build_test_app(config, MockProvider::configured());

    let response = get(&app.router, "/api/events/gone").await;
    assert!(app.state.registry.is_subscribed("gone").await);
    assert_eq!(app.state.pollers.active_count(), 1);

    drop(response);

    let registry = std::sync::Arc::clone(&app.state.registry);
    let pollers = std::sync::Arc::clone(&app.state.pollers);
    assert!(eventually(move || {
        let registry = std::sync::Arc::clone(&registry);
        let pollers = std::sync::Arc::clone(&pollers);
        async move { registry.subscription_count().await == 0 && pollers.active_count() == 0 }
    })
    .await);
}
