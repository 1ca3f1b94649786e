//! Upload gateway: forwards the source image and driving video to provider
//! storage.

use reelswap_core::error::CoreError;
use serde::Serialize;

use crate::messages::UploadFile;
use crate::provider::GenerationProvider;

pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Public URLs of a stored source pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedPair {
    pub image_url: String,
    pub video_url: String,
}

/// Store an (image, video) pair and return both public URLs.
///
/// Fails with [`CoreError::Config`] when the provider has no credential and
/// with [`CoreError::Validation`] when either file is missing; both checks
/// happen before any upload starts. Either both URLs come back or an error
/// does.
pub async fn upload_pair(
    provider: &dyn GenerationProvider,
    image: Option<UploadFile>,
    video: Option<UploadFile>,
) -> Result<UploadedPair, CoreError> {
    if !provider.is_configured() {
        return Err(CoreError::Config("FAL_KEY not configured on server".into()));
    }

    let (Some(image), Some(video)) = (image, video) else {
        return Err(CoreError::Validation(
            "Both image and video files are required".into(),
        ));
    };

    tracing::info!(file_name = %image.file_name, bytes = image.data.len(), "Uploading image");
    let image_url = store(provider, with_default_type(image, DEFAULT_IMAGE_CONTENT_TYPE)).await?;

    tracing::info!(file_name = %video.file_name, bytes = video.data.len(), "Uploading video");
    let video_url = store(provider, with_default_type(video, DEFAULT_VIDEO_CONTENT_TYPE)).await?;

    Ok(UploadedPair {
        image_url,
        video_url,
    })
}

async fn store(provider: &dyn GenerationProvider, file: UploadFile) -> Result<String, CoreError> {
    let file_name = file.file_name.clone();
    let url = provider.upload_file(file).await?;
    if url.trim().is_empty() {
        return Err(CoreError::Upstream(format!(
            "Storage returned no URL for '{file_name}'"
        )));
    }
    Ok(url)
}

fn with_default_type(mut file: UploadFile, default: &str) -> UploadFile {
    let declared = file
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty());
    if declared.is_none() {
        file.content_type = Some(default.to_string());
    }
    file
}
