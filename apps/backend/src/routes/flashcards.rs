//! Single-card endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::require_text;
use crate::AppState;

/// POST /flashcards
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateFlashcardRequest>,
) -> Result<Json<Flashcard>> {
    let set_id = req
        .set_id
        .ok_or_else(|| ApiError::BadRequest("set_id is required".to_string()))?;
    let question = require_text(req.question, "question")?;
    let answer = require_text(req.answer, "answer")?;

    let card = state.db.create_flashcard(set_id, &question, &answer).await?;
    Ok(Json(card))
}

/// PATCH /flashcards/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFlashcardRequest>,
) -> Result<Json<Flashcard>> {
    let question = require_text(req.question, "question")?;
    let answer = require_text(req.answer, "answer")?;

    let card = state
        .db
        .update_flashcard(id, &question, &answer)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard {}", id)))?;

    Ok(Json(card))
}

/// DELETE /flashcards/:id
///
/// Succeeds for unknown or already deleted cards.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<SuccessResponse>> {
    state.db.delete_flashcard(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
