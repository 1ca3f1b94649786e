//! Handlers for job submission and one-shot status queries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reelswap_core::error::CoreError;
use reelswap_core::job::{JobEvent, JobState};
use reelswap_core::types::JobId;
use reelswap_fal::submit::{submit_generation, GenerateRequest};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response body for `POST /api/generate-from-urls`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub request_id: JobId,
    /// Set in poll mode; the job starts out queued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
    /// Set in push mode; tells the client to open the event stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/generate-from-urls
///
/// Submits a generation job for an already-uploaded image and video. In
/// push mode the provider is given this server's webhook address.
pub async fn generate_from_urls(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let webhook_url = state.config.webhook_url();
    let request_id =
        submit_generation(state.provider.as_ref(), request, webhook_url.as_deref()).await?;

    tracing::info!(job_id = %request_id, push = webhook_url.is_some(), "Job submitted");

    let response = if webhook_url.is_some() {
        SubmitResponse {
            request_id,
            state: None,
            message: Some("Job submitted. Connect to the event stream for updates.".into()),
        }
    } else {
        SubmitResponse {
            request_id,
            state: Some(JobState::Queued),
            message: None,
        }
    };
    Ok(Json(response))
}

/// GET /api/job-status/{request_id}
///
/// Queries the provider once and returns the normalized event, including
/// provider logs and metrics when present. A failed job answers 500 with
/// the event as the body.
pub async fn job_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<(StatusCode, Json<JobEvent>)> {
    if !state.provider.is_configured() {
        return Err(AppError::Core(CoreError::Config(
            "FAL_KEY not configured on server".into(),
        )));
    }

    let event = state.provider.job_status(&request_id).await?;
    tracing::debug!(job_id = %request_id, state = %event.state, "Status queried");

    let status = if event.state == JobState::Failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((status, Json(event)))
}
