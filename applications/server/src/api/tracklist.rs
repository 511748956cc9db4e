/// Tracklist API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use lyra_core::TlTrack;
use lyra_playback::{Criteria, TracklistOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TracklistResponse {
    pub version: u64,
    pub tl_tracks: Vec<TlTrack>,
    pub options: TracklistOptions,
}

#[derive(Debug, Deserialize)]
pub struct AddTracks {
    pub uris: Vec<String>,
    pub at_position: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MoveTracks {
    pub start: usize,
    pub end: usize,
    pub to_position: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShuffleTracks {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOptions {
    pub repeat: Option<bool>,
    pub random: Option<bool>,
    pub single: Option<bool>,
    pub consume: Option<bool>,
}

/// GET /api/tracklist - Entries, version and mode flags
pub async fn get_tracklist(State(app_state): State<AppState>) -> Result<Json<TracklistResponse>> {
    let (version, tl_tracks) = app_state.core.tl_tracks().await?;
    let options = app_state.core.options().await?;

    Ok(Json(TracklistResponse {
        version,
        tl_tracks,
        options,
    }))
}

/// POST /api/tracklist - Look up URIs and queue the tracks
pub async fn add_tracks(
    State(app_state): State<AppState>,
    Json(request): Json<AddTracks>,
) -> Result<(StatusCode, Json<Vec<TlTrack>>)> {
    if request.uris.is_empty() {
        return Err(ServerError::BadRequest("uris must not be empty".to_string()));
    }

    let added = app_state
        .core
        .add_uris(request.uris, request.at_position)
        .await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// DELETE /api/tracklist - Remove matching entries, or everything without a body
///
/// The body is a criteria object such as `{"tlid": [1, 2]}` or
/// `{"uri": ["file:///a.flac"]}`.
pub async fn remove_tracks(
    State(app_state): State<AppState>,
    criteria: Option<Json<serde_json::Value>>,
) -> Result<Json<Vec<TlTrack>>> {
    let Some(Json(criteria)) = criteria else {
        let (_, tl_tracks) = app_state.core.tl_tracks().await?;
        app_state.core.clear().await?;
        return Ok(Json(tl_tracks));
    };

    let criteria = Criteria::from_value(&criteria)?;
    Ok(Json(app_state.core.remove(criteria).await?))
}

/// POST /api/tracklist/move - Move `[start, end)` to `to_position`
pub async fn move_tracks(
    State(app_state): State<AppState>,
    Json(request): Json<MoveTracks>,
) -> Result<Json<TracklistResponse>> {
    app_state
        .core
        .move_range(request.start, request.end, request.to_position)
        .await?;
    get_tracklist(State(app_state)).await
}

/// POST /api/tracklist/shuffle - Shuffle `[start, end)`, or everything
pub async fn shuffle_tracks(
    State(app_state): State<AppState>,
    request: Option<Json<ShuffleTracks>>,
) -> Result<Json<TracklistResponse>> {
    let Json(request) = request.unwrap_or_default();
    app_state.core.shuffle(request.start, request.end).await?;
    get_tracklist(State(app_state)).await
}

/// PUT /api/tracklist/options - Change the mode flags that are given
pub async fn update_options(
    State(app_state): State<AppState>,
    Json(update): Json<UpdateOptions>,
) -> Result<Json<TracklistOptions>> {
    let options = app_state
        .core
        .set_options(update.repeat, update.random, update.single, update.consume)
        .await?;
    Ok(Json(options))
}
