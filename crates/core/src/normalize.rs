//! Status normalization for provider payloads.
//!
//! The provider has reported job state under several shapes over time: the
//! identifier, status word, result body and error text have each lived under
//! more than one key. Lookups are driven by the ordered key tables below
//! (first present, non-null key wins) instead of per-shape branching, so a
//! new alias is a one-line change.

use serde_json::Value;

use crate::error::CoreError;
use crate::job::{JobEvent, VideoOutput};
use crate::types::JobId;

/// Keys that may carry the job identifier, in priority order.
pub const JOB_ID_KEYS: &[&str] = &["request_id", "requestId", "gateway_request_id", "id"];

/// Keys that may carry the status word.
pub const STATUS_KEYS: &[&str] = &["status", "state"];

/// Keys that may wrap the result body.
pub const RESULT_KEYS: &[&str] = &["payload", "output", "result"];

/// Keys that may carry a human-readable failure description.
pub const ERROR_KEYS: &[&str] = &["error", "message", "detail"];

/// Fallback text when a failed job carries no error of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Job failed";

/// A normalized provider update addressed to one job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderUpdate {
    pub job_id: JobId,
    pub event: JobEvent,
}

/// Return the value of the first key in `keys` that is present and not `null`.
pub fn first_match<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(*key))
        .find(|value| !value.is_null())
}

/// Extract the job identifier. Numeric ids are accepted and stringified.
///
/// Blank strings and other unusable values do not end the search; the next
/// alias in [`JOB_ID_KEYS`] is tried.
pub fn extract_job_id(body: &Value) -> Option<JobId> {
    JOB_ID_KEYS
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Locate the generated video inside a result body.
///
/// Accepts `{ "video": { "url": ... } }` (the whole object is echoed) and
/// `{ "video": "<url>" }`.
pub fn extract_video(result: &Value) -> Option<VideoOutput> {
    let video = result.get("video")?;
    match video {
        Value::String(url) if !url.is_empty() => Some(VideoOutput::from_url(url.clone())),
        Value::Object(fields) => {
            let has_url = matches!(fields.get("url"), Some(Value::String(url)) if !url.is_empty());
            if has_url {
                serde_json::from_value(video.clone()).ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Extract a failure description, rendering structured errors as JSON text.
pub fn extract_error(body: &Value) -> Option<String> {
    let candidates = std::iter::once(body).chain(first_match(body, RESULT_KEYS));
    for candidate in candidates {
        match first_match(candidate, ERROR_KEYS) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::String(_)) | None => continue,
            Some(other) => return Some(other.to_string()),
        }
    }
    None
}

/// Collapse a provider status body into a canonical [`JobEvent`].
///
/// Status words are compared case-insensitively:
///
/// | Provider word          | Canonical state                                  |
/// |------------------------|--------------------------------------------------|
/// | `OK`, `COMPLETED`      | `COMPLETED` if a video URL is found, else `FAILED` |
/// | `FAILED`, `ERROR`      | `FAILED`                                         |
/// | `IN_PROGRESS`          | `IN_PROGRESS`                                    |
/// | `QUEUED`, `IN_QUEUE`   | `QUEUED`                                         |
/// | missing                | `IN_PROGRESS`                                    |
/// | anything else          | passed through verbatim                          |
pub fn normalize_status(body: &Value) -> JobEvent {
    let Some(raw) = first_match(body, STATUS_KEYS).and_then(Value::as_str) else {
        return JobEvent::in_progress();
    };

    match raw.trim().to_ascii_uppercase().as_str() {
        "OK" | "COMPLETED" => normalize_completion(body),
        "FAILED" | "ERROR" => JobEvent::failed(
            extract_error(body).unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        ),
        "IN_PROGRESS" => JobEvent::in_progress(),
        "QUEUED" | "IN_QUEUE" => JobEvent::queued(),
        _ => JobEvent::other(raw),
    }
}

/// Normalize a body whose status already claims completion.
///
/// The video is looked up in the wrapped result body when there is one,
/// otherwise at the top level (the shape of a fetched queue result).
/// A completion without a usable video URL is reported as a failure rather
/// than forwarded as a broken success.
pub fn normalize_completion(body: &Value) -> JobEvent {
    let result = first_match(body, RESULT_KEYS).unwrap_or(body);
    match extract_video(result) {
        Some(video) => JobEvent::completed(video),
        None => JobEvent::failed(
            "Provider reported completion but no video URL was found in the result",
        ),
    }
}

/// Normalize a pushed provider notification (webhook body).
///
/// Fails with [`CoreError::Parse`] when the body is not an object or no job
/// identifier can be extracted; without one the update cannot be routed.
pub fn normalize_update(body: &Value) -> Result<ProviderUpdate, CoreError> {
    if !body.is_object() {
        return Err(CoreError::Parse("notification body is not a JSON object".into()));
    }
    let job_id = extract_job_id(body).ok_or_else(|| {
        CoreError::Parse(format!(
            "no job identifier under any of {}",
            JOB_ID_KEYS.join(", ")
        ))
    })?;

    Ok(ProviderUpdate {
        job_id,
        event: normalize_status(body),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
