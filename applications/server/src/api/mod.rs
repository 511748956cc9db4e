/// API route modules
pub mod health;
pub mod history;
pub mod library;
pub mod mixer;
pub mod playback;
pub mod playlists;
pub mod tracklist;

use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the `/api` router
pub fn create_router(app_state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        // Playback
        .route("/playback", get(playback::get_playback))
        .route("/playback/play", post(playback::play))
        .route("/playback/pause", post(playback::pause))
        .route("/playback/resume", post(playback::resume))
        .route("/playback/stop", post(playback::stop))
        .route("/playback/next", post(playback::next))
        .route("/playback/previous", post(playback::previous))
        .route("/playback/seek", post(playback::seek))
        // Tracklist
        .route(
            "/tracklist",
            get(tracklist::get_tracklist)
                .post(tracklist::add_tracks)
                .delete(tracklist::remove_tracks),
        )
        .route("/tracklist/move", post(tracklist::move_tracks))
        .route("/tracklist/shuffle", post(tracklist::shuffle_tracks))
        .route("/tracklist/options", put(tracklist::update_options))
        // Library and playlists
        .route("/library/search", post(library::search))
        .route(
            "/playlists",
            get(playlists::list_playlists)
                .post(playlists::create_playlist)
                .put(playlists::save_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlists/lookup", get(playlists::lookup_playlist))
        .route("/playlists/items", get(playlists::playlist_items))
        .route("/playlists/refresh", post(playlists::refresh_playlists))
        // History and mixer
        .route("/history", get(history::get_history))
        .route("/mixer", get(mixer::get_mixer).put(mixer::update_mixer));

    Router::new()
        .nest("/api", routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
