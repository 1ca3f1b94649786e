//! The seam between the HTTP layer and the generation provider.
//!
//! Handlers hold an `Arc<dyn GenerationProvider>` so tests can swap in a
//! scripted provider without any network.

use async_trait::async_trait;
use reelswap_core::error::CoreError;
use reelswap_core::job::JobEvent;
use reelswap_core::normalize::{normalize_completion, normalize_status};
use reelswap_core::types::JobId;

use crate::api::FalApi;
use crate::messages::{GenerationInput, UploadFile};

/// Operations the relay needs from a generation provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Whether a credential is configured. Checked before any network call.
    fn is_configured(&self) -> bool;

    /// Store one file and return its public URL.
    async fn upload_file(&self, file: UploadFile) -> Result<String, CoreError>;

    /// Queue a generation job and return the provider-assigned id.
    async fn submit_job(
        &self,
        input: &GenerationInput,
        webhook_url: Option<&str>,
    ) -> Result<JobId, CoreError>;

    /// Query a job once and return its normalized state.
    async fn job_status(&self, job_id: &str) -> Result<JobEvent, CoreError>;
}

#[async_trait]
impl GenerationProvider for FalApi {
    fn is_configured(&self) -> bool {
        self.has_credential()
    }

    async fn upload_file(&self, file: UploadFile) -> Result<String, CoreError> {
        Ok(FalApi::upload_file(self, &file).await?)
    }

    async fn submit_job(
        &self,
        input: &GenerationInput,
        webhook_url: Option<&str>,
    ) -> Result<JobId, CoreError> {
        let submission = self.submit(input, webhook_url).await?;
        tracing::info!(
            job_id = %submission.request_id,
            model = %self.config().model_id,
            push = webhook_url.is_some(),
            "Job submitted to fal queue",
        );
        Ok(submission.request_id)
    }

    /// Completed jobs need a second round trip: the status document only
    /// points at the result, it does not contain it. A completed status
    /// carrying an error is a failed job and its result is never fetched.
    async fn job_status(&self, job_id: &str) -> Result<JobEvent, CoreError> {
        let status = self.status(job_id).await?;
        tracing::debug!(job_id, status = %status.status, queue_position = ?status.queue_position, "fal status");

        let failure = if status.is_completed() {
            status.failure_message()
        } else {
            None
        };

        let event = if let Some(message) = failure {
            tracing::info!(job_id, error = %message, "fal reported the request as failed");
            JobEvent::failed(message)
        } else if status.is_completed() {
            let result = self.result(job_id, status.response_url.as_deref()).await?;
            normalize_completion(&result)
        } else {
            normalize_status(&serde_json::json!({
                "status": status.status,
                "error": status.error,
            }))
        };

        Ok(event.with_logs(status.logs).with_metrics(status.metrics))
    }
}
