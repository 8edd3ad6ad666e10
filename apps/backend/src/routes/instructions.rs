use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::RecentInstructionsResponse;
use crate::AppState;

const RECENT_LIMIT: i64 = 3;

/// GET /recent-instructions
pub async fn recent(State(state): State<AppState>) -> Result<Json<RecentInstructionsResponse>> {
    let instructions = state.db.get_recent_custom_instructions(RECENT_LIMIT).await?;
    Ok(Json(RecentInstructionsResponse { instructions }))
}
