//! Handler for provider push notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Whether the body parsed as JSON.
    pub received: bool,
    /// Whether a subscribed client got the event.
    pub delivered: bool,
}

/// POST /api/webhook
///
/// Normalizes the notification and relays it to the job's subscriber.
/// Always answers 200, so the provider never retries: an unparsable body is
/// logged and acknowledged with `received: false`.
pub async fn receive(State(state): State<AppState>, body: Bytes) -> Json<WebhookAck> {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Discarding unparsable webhook body");
            return Json(WebhookAck {
                received: false,
                delivered: false,
            });
        }
    };

    let outcome = state.relay.relay_notification(&payload).await;

    Json(WebhookAck {
        received: true,
        delivered: outcome.delivered(),
    })
}
