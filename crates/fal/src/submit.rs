//! Job submitter: validates a generation request and queues it with the
//! provider.

use reelswap_core::error::CoreError;
use reelswap_core::types::JobId;
use serde::Deserialize;

use crate::messages::GenerationInput;
use crate::provider::GenerationProvider;

pub const DEFAULT_ORIENTATION: &str = "video";

/// Body of `POST /api/generate-from-urls`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub character_orientation: Option<String>,
    pub prompt: Option<String>,
}

impl GenerateRequest {
    /// Validate the request and fill defaults.
    pub fn into_input(self) -> Result<GenerationInput, CoreError> {
        let (Some(image_url), Some(video_url)) = (non_empty(self.image_url), non_empty(self.video_url))
        else {
            return Err(CoreError::Validation(
                "Both image_url and video_url are required".into(),
            ));
        };

        Ok(GenerationInput {
            image_url,
            video_url,
            character_orientation: non_empty(self.character_orientation)
                .unwrap_or_else(|| DEFAULT_ORIENTATION.to_string()),
            prompt: self.prompt.unwrap_or_default(),
        })
    }
}

/// Queue a generation job and return the provider-assigned id.
///
/// Configuration and validation failures are raised before the provider is
/// contacted. `webhook_url`, when given, is where the provider will push
/// state changes.
pub async fn submit_generation(
    provider: &dyn GenerationProvider,
    request: GenerateRequest,
    webhook_url: Option<&str>,
) -> Result<JobId, CoreError> {
    if !provider.is_configured() {
        return Err(CoreError::Config("FAL_KEY not configured on server".into()));
    }
    let input = request.into_input()?;

    tracing::info!(orientation = %input.character_orientation, push = webhook_url.is_some(), "Submitting job to queue");
    let job_id = provider.submit_job(&input, webhook_url).await?;
    if job_id.trim().is_empty() {
        return Err(CoreError::Upstream("Provider returned an empty request id".into()));
    }
    Ok(job_id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
