/// API integration tests
/// Tests complete HTTP request/response cycles against a running core
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lyra_core::Track;
use lyra_playback::{
    Backends, Core, CoreConfig, CoreHandle, DummyAudio, DummyBackend, SoftwareMixer,
};
use lyra_server::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Helper to create a test app around a dummy core
fn create_test_app(config: CoreConfig) -> Router {
    let tracks = ["a", "b", "c"]
        .iter()
        .map(|id| {
            Track::new(format!("dummy:{id}"))
                .with_name(format!("Track {id}"))
                .with_length(60_000)
        })
        .collect();
    let backends =
        Backends::new(vec![Arc::new(DummyBackend::new("dummy").with_tracks(tracks))]).unwrap();
    let core = Core::new(
        config,
        Arc::new(DummyAudio::new()),
        backends,
        Some(Arc::new(SoftwareMixer::new(50))),
    )
    .unwrap();

    create_router(AppState::new(CoreHandle::spawn(core)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, body)
}

async fn add_all(app: &Router) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/tracklist",
        Some(json!({"uris": ["dummy:a", "dummy:b", "dummy:c"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

/// Test GET /api/health
#[tokio::test]
async fn test_health() {
    let app = create_test_app(CoreConfig::default());

    let (status, body) = send(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["core"], true);
}

/// Test adding tracks and reading the tracklist back
#[tokio::test]
async fn test_add_and_list_tracks() {
    let app = create_test_app(CoreConfig::default());

    let added = add_all(&app).await;
    assert_eq!(added.as_array().unwrap().len(), 3);
    assert_eq!(added[0]["tlid"], 1);
    assert_eq!(added[0]["track"]["uri"], "dummy:a");

    let (status, body) = send(&app, "GET", "/api/tracklist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["tl_tracks"].as_array().unwrap().len(), 3);
    assert_eq!(body["options"]["repeat"], false);
}

/// Test validation of add requests
#[tokio::test]
async fn test_add_rejects_bad_requests() {
    let app = create_test_app(CoreConfig::default());

    let (status, _) = send(&app, "POST", "/api/tracklist", Some(json!({"uris": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/tracklist",
        Some(json!({"uris": ["dummy:a"], "at_position": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at_position"));
}

/// Test the tracklist length limit
#[tokio::test]
async fn test_add_beyond_capacity_conflicts() {
    let app = create_test_app(CoreConfig {
        max_tracklist_length: 2,
        ..Default::default()
    });

    let (status, _) = send(
        &app,
        "POST",
        "/api/tracklist",
        Some(json!({"uris": ["dummy:a", "dummy:b", "dummy:c"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, "GET", "/api/tracklist", None).await;
    assert!(body["tl_tracks"].as_array().unwrap().is_empty());
}

/// Test play, pause, resume and stop
#[tokio::test]
async fn test_playback_commands() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;

    let (status, body) = send(&app, "POST", "/api/playback/play", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "playing");
    assert_eq!(body["current"]["tlid"], 1);

    let (_, body) = send(&app, "POST", "/api/playback/pause", None).await;
    assert_eq!(body["state"], "paused");

    let (_, body) = send(&app, "POST", "/api/playback/resume", None).await;
    assert_eq!(body["state"], "playing");

    let (_, body) = send(&app, "POST", "/api/playback/next", None).await;
    assert_eq!(body["current"]["tlid"], 2);

    let (_, body) = send(&app, "POST", "/api/playback/previous", None).await;
    assert_eq!(body["current"]["tlid"], 1);

    let (_, body) = send(&app, "POST", "/api/playback/stop", None).await;
    assert_eq!(body["state"], "stopped");
}

/// Test playing a specific entry
#[tokio::test]
async fn test_play_specific_tlid() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;

    let (status, body) = send(&app, "POST", "/api/playback/play", Some(json!({"tlid": 3}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["track"]["uri"], "dummy:c");
}

/// Test seeking
#[tokio::test]
async fn test_seek() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;
    send(&app, "POST", "/api/playback/play", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/playback/seek",
        Some(json!({"time_position": 1500})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"]["time_position"], 1500);
}

/// Test removing by criteria and clearing
#[tokio::test]
async fn test_remove_and_clear() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;

    let by_tlid = json!({"tlid": [2]});
    let (status, removed) = send(&app, "DELETE", "/api/tracklist", Some(by_tlid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed.as_array().unwrap().len(), 1);
    assert_eq!(removed[0]["tlid"], 2);

    let not_a_list = json!({"uri": "dummy:a"});
    let (status, body) = send(&app, "DELETE", "/api/tracklist", Some(not_a_list)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("list"));

    let (status, cleared) = send(&app, "DELETE", "/api/tracklist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/tracklist", None).await;
    assert!(body["tl_tracks"].as_array().unwrap().is_empty());
}

/// Test moving entries
#[tokio::test]
async fn test_move_tracks() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/tracklist/move",
        Some(json!({"start": 0, "end": 1, "to_position": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let uris: Vec<&str> = body["tl_tracks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tl| tl["track"]["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris, vec!["dummy:b", "dummy:c", "dummy:a"]);

    let (status, _) = send(
        &app,
        "POST",
        "/api/tracklist/move",
        Some(json!({"start": 2, "end": 1, "to_position": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Test updating mode flags
#[tokio::test]
async fn test_update_options() {
    let app = create_test_app(CoreConfig::default());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/tracklist/options",
        Some(json!({"repeat": true, "single": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"repeat": true, "random": false, "single": true, "consume": false})
    );
}

/// Test history after playback
#[tokio::test]
async fn test_history() {
    let app = create_test_app(CoreConfig::default());
    add_all(&app).await;
    send(&app, "POST", "/api/playback/play", None).await;
    send(&app, "POST", "/api/playback/next", None).await;

    let (status, body) = send(&app, "GET", "/api/history", None).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["track"]["uri"], "dummy:b");
    assert_eq!(entries[0]["track"]["type"], "track");
}

/// Test mixer reads and updates
#[tokio::test]
async fn test_mixer() {
    let app = create_test_app(CoreConfig::default());

    let (_, body) = send(&app, "GET", "/api/mixer", None).await;
    assert_eq!(body, json!({"volume": 50, "mute": false}));

    let (status, body) = send(
        &app,
        "PUT",
        "/api/mixer",
        Some(json!({"volume": 40, "mute": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"volume": 40, "mute": true}));

    let (status, _) = send(&app, "PUT", "/api/mixer", Some(json!({"volume": 150}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Test library search across backends
#[tokio::test]
async fn test_library_search() {
    let app = create_test_app(CoreConfig::default());

    let (status, body) = send(
        &app,
        "POST",
        "/api/library/search",
        Some(json!({"query": {"track_name": ["track b"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["uri"], "dummy:search");
    assert_eq!(results[0]["tracks"][0]["uri"], "dummy:b");

    let (status, body) = send(
        &app,
        "POST",
        "/api/library/search",
        Some(json!({"query": {"track_name": ["track b"]}, "exact": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["tracks"], json!([]));

    let (status, _) = send(
        &app,
        "POST",
        "/api/library/search",
        Some(json!({"query": {"bitrate": ["320"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

/// Test creating, filling and deleting a playlist
#[tokio::test]
async fn test_playlist_lifecycle() {
    let app = create_test_app(CoreConfig::default());

    let (status, created) =
        send(&app, "POST", "/api/playlists", Some(json!({"name": "mix"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["uri"], "dummy:playlist:mix");

    let (_, list) = send(&app, "GET", "/api/playlists", None).await;
    assert_eq!(
        list,
        json!([{"uri": "dummy:playlist:mix", "name": "mix", "type": "playlist"}])
    );

    let mut playlist = created.clone();
    playlist["tracks"] = json!([{"uri": "dummy:a", "name": "Track a"}]);
    let (status, saved) = send(&app, "PUT", "/api/playlists", Some(playlist)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["tracks"][0]["uri"], "dummy:a");

    let items_uri = "/api/playlists/items?uri=dummy:playlist:mix";
    let (status, items) = send(&app, "GET", items_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["uri"], "dummy:a");

    let lookup_uri = "/api/playlists/lookup?uri=dummy:playlist:mix";
    let (status, found) = send(&app, "GET", lookup_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "mix");

    let (status, _) = send(&app, "DELETE", "/api/playlists?uri=dummy:playlist:mix", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", lookup_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Test playlist requests that cannot succeed
#[tokio::test]
async fn test_playlist_errors() {
    let app = create_test_app(CoreConfig::default());

    let (status, _) = send(&app, "POST", "/api/playlists", Some(json!({"name": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = json!({"uri": "dummy:playlist:absent", "name": "absent"});
    let (status, _) = send(&app, "PUT", "/api/playlists", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/playlists/items?uri=nonsense", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/playlists/refresh", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
