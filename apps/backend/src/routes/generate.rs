//! Flashcard generation endpoint

use axum::{extract::State, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::generation::GenerationInput;
use crate::AppState;

/// POST /generate-flashcards
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let image_ids = req.ids();
    if image_ids.is_empty() {
        return Err(ApiError::BadRequest("imageIds is required".to_string()));
    }
    let model = req
        .model
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("model is required".to_string()))?;

    let created = state
        .generator
        .generate(GenerationInput {
            image_ids,
            model,
            custom_instructions: req.custom_instructions,
        })
        .await?;

    Ok(Json(GenerateResponse {
        success: true,
        flashcard_set: created.set,
        flashcards: created.flashcards,
    }))
}
