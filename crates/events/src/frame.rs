//! Frames pushed to event-stream subscribers.

use reelswap_core::job::JobEvent;
use serde::Serialize;

/// Status word of the acknowledgement frame.
pub const CONNECTED_STATUS: &str = "CONNECTED";

/// Acknowledgement sent as soon as a subscription is registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedFrame {
    pub status: &'static str,
}

/// One frame on a subscriber's stream.
///
/// Serializes without a tag: `{"status":"CONNECTED"}` or
/// `{"state":..., "video"?:..., "error"?:...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayFrame {
    Connected(ConnectedFrame),
    Job(JobEvent),
}

impl RelayFrame {
    pub fn connected() -> Self {
        RelayFrame::Connected(ConnectedFrame {
            status: CONNECTED_STATUS,
        })
    }

    /// Wrap a job event, dropping polling diagnostics.
    pub fn job(event: JobEvent) -> Self {
        RelayFrame::Job(event.without_diagnostics())
    }

    /// Serialize to the JSON text written to the wire.
    pub fn to_json(&self) -> String {
        // Serializing these types cannot fail: all keys are strings.
        serde_json::to_string(self).unwrap_or_default()
    }
}
