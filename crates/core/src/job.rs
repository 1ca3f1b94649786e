//! Canonical job vocabulary.
//!
//! Whatever the provider sends, browsers only ever see a [`JobEvent`] whose
//! `state` is one of the four canonical values, or an unrecognised provider
//! status passed through verbatim.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Canonical lifecycle state of a generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// A provider status we do not recognise, forwarded as received.
    Other(String),
}

impl JobState {
    /// Wire representation of the state.
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::InProgress => "IN_PROGRESS",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Other(raw) => raw,
        }
    }

    /// `COMPLETED` and `FAILED` end a job; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Parse the canonical wire form. Non-canonical strings become [`JobState::Other`].
    pub fn from_wire(s: &str) -> Self {
        match s {
            "QUEUED" => JobState::Queued,
            "IN_PROGRESS" => JobState::InProgress,
            "COMPLETED" => JobState::Completed,
            "FAILED" => JobState::Failed,
            other => JobState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(JobState::from_wire(&s))
    }
}

// ---------------------------------------------------------------------------
// VideoOutput
// ---------------------------------------------------------------------------

/// The generated video as reported by the provider.
///
/// Only `url` is required. Any other fields the provider attaches
/// (`content_type`, `file_name`, `file_size`, ...) are echoed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoOutput {
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VideoOutput {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// One normalized status observation for a job.
///
/// Serializes to `{ state, video?, error?, logs?, metrics? }`; absent fields
/// are omitted rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider log lines (polling only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<serde_json::Value>,
    /// Provider timing metrics (polling only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl JobEvent {
    fn bare(state: JobState) -> Self {
        Self {
            state,
            video: None,
            error: None,
            logs: None,
            metrics: None,
        }
    }

    pub fn queued() -> Self {
        Self::bare(JobState::Queued)
    }

    pub fn in_progress() -> Self {
        Self::bare(JobState::InProgress)
    }

    pub fn completed(video: VideoOutput) -> Self {
        Self {
            video: Some(video),
            ..Self::bare(JobState::Completed)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::bare(JobState::Failed)
        }
    }

    pub fn other(raw_state: impl Into<String>) -> Self {
        Self::bare(JobState::Other(raw_state.into()))
    }

    pub fn with_logs(mut self, logs: Option<serde_json::Value>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_metrics(mut self, metrics: Option<serde_json::Value>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Drop polling diagnostics, leaving the `{ state, video?, error? }`
    /// shape pushed to event-stream subscribers.
    pub fn without_diagnostics(mut self) -> Self {
        self.logs = None;
        self.metrics = None;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
        assert!(!JobState::Other("CANCELLED".into()).is_terminal());
    }

    #[test]
    fn other_state_serializes_verbatim() {
        let event = JobEvent::other("warming_up");
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({"state": "warming_up"}));
    }

    #[test]
    fn completed_event_omits_empty_fields() {
        let event = JobEvent::completed(VideoOutput::from_url("u"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"state": "COMPLETED", "video": {"url": "u"}})
        );
    }

    #[test]
    fn video_extra_fields_are_echoed() {
        let raw = json!({"url": "https://x/y.mp4", "content_type": "video/mp4", "file_size": 42});
        let video: VideoOutput = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(video.url, "https://x/y.mp4");
        assert_eq!(serde_json::to_value(&video).unwrap(), raw);
    }

    #[test]
    fn without_diagnostics_strips_logs_and_metrics() {
        let event = JobEvent::in_progress()
            .with_logs(Some(json!([{"message": "step 1"}])))
            .with_metrics(Some(json!({"inference_time": 3.2})))
            .without_diagnostics();
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({"state": "IN_PROGRESS"}));
    }
}
