//! Image upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

const FILE_FIELD: &str = "file";

/// POST /upload (multipart, field `file`)
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        if !mime_type.starts_with("image/") {
            return Err(ApiError::BadRequest("File must be an image".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {}", e)))?;

        let stored = state.storage.save(&filename, &bytes).await?;
        let image = state
            .db
            .create_image(&NewImage {
                filename,
                filepath: stored.public_path,
                mime_type,
                size: bytes.len() as i64,
            })
            .await?;

        tracing::info!("Uploaded image {} as {}", image.id, image.filepath);
        return Ok(Json(UploadResponse {
            success: true,
            image,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}
