/// Playlists API routes
///
/// Playlist URIs carry their own scheme and separators, so they travel in
/// the query string rather than the path.
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use lyra_core::{Playlist, Ref};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlaylistUri {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
    pub uri_scheme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshPlaylists {
    pub uri_scheme: Option<String>,
}

/// GET /api/playlists - References to every playlist
pub async fn list_playlists(State(app_state): State<AppState>) -> Result<Json<Vec<Ref>>> {
    Ok(Json(app_state.core.playlists().await?))
}

/// POST /api/playlists - Create an empty playlist
pub async fn create_playlist(
    State(app_state): State<AppState>,
    Json(request): Json<CreatePlaylist>,
) -> Result<(StatusCode, Json<Playlist>)> {
    if request.name.trim().is_empty() {
        return Err(ServerError::BadRequest("name must not be empty".to_string()));
    }

    let playlist = app_state
        .core
        .create_playlist(request.name, request.uri_scheme)
        .await?
        .ok_or_else(|| ServerError::BadRequest("No backend created the playlist".to_string()))?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// PUT /api/playlists - Save a playlist, returning it as stored
pub async fn save_playlist(
    State(app_state): State<AppState>,
    Json(playlist): Json<Playlist>,
) -> Result<Json<Playlist>> {
    let uri = playlist.uri.clone();
    app_state
        .core
        .save_playlist(playlist)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Playlist {uri}")))
}

/// DELETE /api/playlists?uri=... - Delete a playlist
pub async fn delete_playlist(
    State(app_state): State<AppState>,
    Query(PlaylistUri { uri }): Query<PlaylistUri>,
) -> Result<StatusCode> {
    if app_state.core.delete_playlist(uri.clone()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound(format!("Playlist {uri}")))
    }
}

/// GET /api/playlists/lookup?uri=... - Full playlist
pub async fn lookup_playlist(
    State(app_state): State<AppState>,
    Query(PlaylistUri { uri }): Query<PlaylistUri>,
) -> Result<Json<Playlist>> {
    app_state
        .core
        .lookup_playlist(uri.clone())
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Playlist {uri}")))
}

/// GET /api/playlists/items?uri=... - Item references of a playlist
pub async fn playlist_items(
    State(app_state): State<AppState>,
    Query(PlaylistUri { uri }): Query<PlaylistUri>,
) -> Result<Json<Vec<Ref>>> {
    app_state
        .core
        .playlist_items(uri.clone())
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Playlist {uri}")))
}

/// POST /api/playlists/refresh - Reload playlists, optionally of one scheme
pub async fn refresh_playlists(
    State(app_state): State<AppState>,
    request: Option<Json<RefreshPlaylists>>,
) -> Result<StatusCode> {
    let Json(request) = request.unwrap_or_default();
    app_state.core.refresh_playlists(request.uri_scheme).await?;
    Ok(StatusCode::NO_CONTENT)
}
