//! Flashcard set endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::require_id;
use crate::AppState;

/// GET /flashcard-sets
pub async fn list(State(state): State<AppState>) -> Result<Json<SetListResponse>> {
    let sets = state.db.list_sets_with_cards().await?;
    Ok(Json(SetListResponse {
        success: true,
        sets,
    }))
}

/// GET /flashcard-sets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<SetWithCards>> {
    let set = state
        .db
        .get_set(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard set {}", id)))?;
    let flashcards = state.db.get_flashcards_by_set(id).await?;

    Ok(Json(SetWithCards { set, flashcards }))
}

/// PATCH /flashcard-sets/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<SetPatch>,
) -> Result<Json<FlashcardSet>> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field (title, description, or flip_mode) must be provided".to_string(),
        ));
    }
    if matches!(&patch.title, Some(t) if t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title cannot be empty".to_string()));
    }

    let set = state
        .db
        .update_set(id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard set {}", id)))?;

    tracing::info!("Updated flashcard set {}", id);
    Ok(Json(set))
}

/// DELETE /flashcard-sets?id=
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>> {
    let id = require_id(query.id.as_deref(), "id")?;

    if state.db.delete_set(id).await? {
        tracing::info!("Deleted flashcard set {}", id);
    }
    Ok(Json(SuccessResponse::ok()))
}
