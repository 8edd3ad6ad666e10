//! Study progress endpoints and the study view

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::require_id;
use crate::AppState;

/// GET /study-progress?setId=
pub async fn progress(
    State(state): State<AppState>,
    Query(query): Query<SetIdQuery>,
) -> Result<Json<ProgressListResponse>> {
    let set_id = require_id(query.set_id.as_deref(), "setId")?;
    let progress = state.db.get_progress_by_set(set_id).await?;
    Ok(Json(ProgressListResponse { progress }))
}

/// POST /study-progress
pub async fn mark(
    State(state): State<AppState>,
    Json(req): Json<MarkProgressRequest>,
) -> Result<Json<ProgressResponse>> {
    let (Some(set_id), Some(flashcard_id), Some(dont_know)) =
        (req.set_id, req.flashcard_id, req.dont_know)
    else {
        return Err(ApiError::BadRequest(
            "setId, flashcardId and dontKnow are required".to_string(),
        ));
    };

    let progress = state.db.mark_dont_know(set_id, flashcard_id, dont_know).await?;
    Ok(Json(ProgressResponse { progress }))
}

/// DELETE /study-progress?setId=
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<SetIdQuery>,
) -> Result<Json<SuccessResponse>> {
    let set_id = require_id(query.set_id.as_deref(), "setId")?;
    let removed = state.db.reset_progress(set_id).await?;
    tracing::info!("Reset {} progress rows for set {}", removed, set_id);
    Ok(Json(SuccessResponse::ok()))
}

/// GET /flashcard-sets/:id/study
///
/// Cards in display order with sides swapped under flip mode. Read only.
pub async fn view(
    State(state): State<AppState>,
    Path(set_id): Path<i64>,
    Query(query): Query<StudyViewQuery>,
) -> Result<Json<StudyViewResponse>> {
    let set = state
        .db
        .get_set(set_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard set {}", set_id)))?;
    let flashcards = state.db.get_flashcards_by_set(set_id).await?;

    let marked: HashSet<i64> = state
        .db
        .get_progress_by_set(set_id)
        .await?
        .into_iter()
        .filter(|p| p.dont_know)
        .map(|p| p.flashcard_id)
        .collect();

    let cards: Vec<StudyCard> = flashcards
        .iter()
        .map(|card| {
            let sides = flashcard_core::sides(&card.question, &card.answer, set.flip_mode);
            StudyCard {
                id: card.id,
                front: sides.front.to_string(),
                back: sides.back.to_string(),
                order_index: card.order_index,
                dont_know: marked.contains(&card.id),
            }
        })
        .collect();
    let dont_know_count = cards.iter().filter(|c| c.dont_know).count();

    let cards = if query.only_dont_know {
        cards.into_iter().filter(|c| c.dont_know).collect()
    } else {
        cards
    };

    Ok(Json(StudyViewResponse {
        set,
        cards,
        dont_know_count,
    }))
}
