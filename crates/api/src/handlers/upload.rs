//! Handler for `POST /api/upload`.

use axum::extract::{Multipart, State};
use axum::Json;
use reelswap_fal::messages::UploadFile;
use reelswap_fal::upload::{upload_pair, UploadedPair};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/upload
///
/// Accepts a multipart form with `image` and `video` file fields, stores
/// both with the provider and returns their public URLs. Empty parts count
/// as missing.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadedPair>> {
    let mut image: Option<UploadFile> = None;
    let mut video: Option<UploadFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        let slot = match name.as_str() {
            "image" => &mut image,
            "video" => &mut video,
            _ => continue, // ignore unknown fields
        };

        let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if data.is_empty() {
            tracing::debug!(field = %name, "Ignoring empty upload part");
            continue;
        }

        *slot = Some(UploadFile {
            file_name,
            content_type,
            data,
        });
    }

    let pair = upload_pair(state.provider.as_ref(), image, video).await?;
    tracing::info!(image_url = %pair.image_url, video_url = %pair.video_url, "Upload complete");
    Ok(Json(pair))
}
