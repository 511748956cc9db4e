/// History API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use lyra_playback::HistoryEntry;

/// GET /api/history - Played tracks, most recent first
pub async fn get_history(State(app_state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>> {
    Ok(Json(app_state.core.history().await?))
}
