/// Playback control API routes
///
/// Every command answers with the playback status once the core has
/// processed it.
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use lyra_core::Tlid;
use lyra_playback::PlaybackStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PlayCommand {
    pub tlid: Option<Tlid>,
}

#[derive(Debug, Deserialize)]
pub struct SeekCommand {
    /// Target position in milliseconds
    pub time_position: i64,
}

#[derive(Debug, Serialize)]
pub struct SeekResponse {
    pub success: bool,
    pub status: PlaybackStatus,
}

/// GET /api/playback - Current playback status
pub async fn get_playback(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(app_state.core.status().await?))
}

/// POST /api/playback/play - Play a tlid, or the current/first track
pub async fn play(
    State(app_state): State<AppState>,
    command: Option<Json<PlayCommand>>,
) -> Result<Json<PlaybackStatus>> {
    let Json(command) = command.unwrap_or_default();
    app_state.core.play(command.tlid).await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/pause
pub async fn pause(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    app_state.core.pause().await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/resume
pub async fn resume(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    app_state.core.resume().await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/stop
pub async fn stop(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    app_state.core.stop().await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/next
pub async fn next(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    app_state.core.next().await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/previous
pub async fn previous(State(app_state): State<AppState>) -> Result<Json<PlaybackStatus>> {
    app_state.core.previous().await?;
    get_playback(State(app_state)).await
}

/// POST /api/playback/seek - Seek in the current track
pub async fn seek(
    State(app_state): State<AppState>,
    Json(command): Json<SeekCommand>,
) -> Result<Json<SeekResponse>> {
    let success = app_state.core.seek(command.time_position).await?;
    let status = app_state.core.status().await?;
    Ok(Json(SeekResponse { success, status }))
}
