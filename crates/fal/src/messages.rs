//! Request and response bodies exchanged with fal.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An in-memory file on its way to provider storage.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename as sent by the browser.
    pub file_name: String,
    /// Declared MIME type, if the browser sent one.
    pub content_type: Option<String>,
    /// File contents, shared with the request body rather than copied.
    pub data: Bytes,
}

/// Input document for the motion-transfer model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationInput {
    pub image_url: String,
    pub video_url: String,
    /// Whether the character follows the orientation of the `"video"` or the `"image"`.
    pub character_orientation: String,
    pub prompt: String,
}

/// Body for `POST /storage/upload/initiate`.
#[derive(Debug, Serialize)]
pub struct InitiateUploadRequest<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
}

/// Response from `POST /storage/upload/initiate`.
#[derive(Debug, Deserialize)]
pub struct InitiateUploadResponse {
    /// Pre-signed URL the bytes are `PUT` to.
    pub upload_url: String,
    /// Public URL the file is served from once uploaded.
    pub file_url: String,
}

/// Response from a queue submission.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Provider-assigned job identifier.
    pub request_id: String,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Response from `GET .../requests/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct QueueStatusResponse {
    /// `IN_QUEUE`, `IN_PROGRESS` or `COMPLETED`.
    pub status: String,
    /// Where the result can be fetched once completed.
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub logs: Option<serde_json::Value>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl QueueStatusResponse {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("COMPLETED")
    }

    /// The error fal attached to a finished request, rendered as text.
    ///
    /// fal reports a failed request as `COMPLETED` with `error` set; its
    /// result document is then unavailable.
    pub fn failure_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
