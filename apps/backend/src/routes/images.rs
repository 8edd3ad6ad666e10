use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::ImageListResponse;
use crate::AppState;

/// GET /images
pub async fn list(State(state): State<AppState>) -> Result<Json<ImageListResponse>> {
    let images = state.db.list_images().await?;
    Ok(Json(ImageListResponse { images }))
}
