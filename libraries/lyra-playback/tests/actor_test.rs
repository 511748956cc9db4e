//! Core task tests: the core driven through `CoreHandle` with a live engine

mod common;

use common::{default_tracks, TRACK_LENGTH};
use lyra_core::PlaybackState;
use lyra_playback::{
    Backends, ChannelListener, Core, CoreConfig, CoreEvent, CoreHandle, DummyAudio, DummyBackend,
    PlaybackError,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

// ===== Helpers =====

fn spawn_with(config: CoreConfig) -> (CoreHandle, Arc<DummyAudio>) {
    let audio = Arc::new(DummyAudio::new());
    let backend = Arc::new(DummyBackend::new("dummy").with_tracks(default_tracks()));
    let backends = Backends::new(vec![backend]).unwrap();
    let core = Core::new(config, audio.clone(), backends, None).unwrap();
    (CoreHandle::spawn(core), audio)
}

fn spawn() -> (CoreHandle, Arc<DummyAudio>) {
    spawn_with(CoreConfig::default())
}

fn uris(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| format!("dummy:{name}")).collect()
}

/// Wait for the next event with the given name
async fn expect_event(events: &mut broadcast::Receiver<CoreEvent>, name: &str) -> CoreEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if event.name() == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

// ===== Tests =====

#[tokio::test]
async fn test_play_through_handle_starts_first_track() {
    let (core, _audio) = spawn();
    let (listener, mut events) = ChannelListener::new(64);
    core.events().register(Arc::new(listener));

    let added = core.add_uris(uris(&["a", "b", "c"]), None).await.unwrap();
    assert_eq!(added.len(), 3);
    expect_event(&mut events, "tracklist_changed").await;

    core.play(None).await.unwrap();
    let started = expect_event(&mut events, "track_playback_started").await;

    assert_eq!(
        started,
        CoreEvent::TrackPlaybackStarted {
            tl_track: added[0].clone()
        }
    );
    let status = core.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.current, Some(added[0].clone()));
}

#[tokio::test]
async fn test_track_end_advances_to_next_track() {
    let (core, audio) = spawn();
    let (listener, mut events) = ChannelListener::new(64);
    core.events().register(Arc::new(listener));

    let added = core.add_uris(uris(&["a", "b"]), None).await.unwrap();
    core.play(None).await.unwrap();
    expect_event(&mut events, "track_playback_started").await;

    audio.simulate_track_end().await;

    let ended = expect_event(&mut events, "track_playback_ended").await;
    assert_eq!(
        ended,
        CoreEvent::TrackPlaybackEnded {
            tl_track: added[0].clone(),
            time_position: TRACK_LENGTH,
        }
    );
    let started = expect_event(&mut events, "track_playback_started").await;
    assert_eq!(
        started,
        CoreEvent::TrackPlaybackStarted {
            tl_track: added[1].clone()
        }
    );
}

#[tokio::test]
async fn test_last_track_end_stops_playback() {
    let (core, audio) = spawn();
    let (listener, mut events) = ChannelListener::new(64);
    core.events().register(Arc::new(listener));

    core.add_uris(uris(&["a"]), None).await.unwrap();
    core.play(None).await.unwrap();
    expect_event(&mut events, "track_playback_started").await;

    audio.simulate_track_end().await;
    expect_event(&mut events, "track_playback_ended").await;

    let status = core.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Stopped);
    assert_eq!(status.current, None);
}

#[tokio::test]
async fn test_concurrent_adds_get_unique_tlids() {
    let (core, _audio) = spawn();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let core = core.clone();
        tasks.push(tokio::spawn(async move {
            core.add_uris(uris(&["a", "b"]), None).await.unwrap()
        }));
    }

    let mut tlids = HashSet::new();
    for task in tasks {
        for tl_track in task.await.unwrap() {
            assert!(tlids.insert(tl_track.tlid));
        }
    }

    let (_, tl_tracks) = core.tl_tracks().await.unwrap();
    assert_eq!(tlids.len(), 20);
    assert_eq!(tl_tracks.len(), 20);
}

#[tokio::test]
async fn test_unknown_uris_are_skipped() {
    let (core, _audio) = spawn();

    let added = core
        .add_uris(uris(&["a", "nope", "c"]), None)
        .await
        .unwrap();

    let names: Vec<&str> = added.iter().map(|tl| tl.track.uri.as_str()).collect();
    assert_eq!(names, vec!["dummy:a", "dummy:c"]);
}

#[tokio::test]
async fn test_set_options_reports_new_flags() {
    let (core, _audio) = spawn();

    let options = core
        .set_options(Some(true), None, None, Some(true))
        .await
        .unwrap();

    assert!(options.repeat);
    assert!(options.consume);
    assert!(!options.random);
    assert_eq!(core.options().await.unwrap(), options);
}

#[tokio::test]
async fn test_handle_fails_after_shutdown() {
    let (core, _audio) = spawn();

    core.shutdown().await.unwrap();

    assert!(matches!(core.play(None).await, Err(PlaybackError::ActorStopped)));
    assert!(matches!(core.shutdown().await, Err(PlaybackError::ActorStopped)));
}

#[tokio::test]
async fn test_shutdown_saves_state_for_next_start() {
    let dir = TempDir::new().unwrap();
    let config = CoreConfig {
        restore_state: true,
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let (core, _audio) = spawn_with(config.clone());
    let added = core.add_uris(uris(&["a", "b"]), None).await.unwrap();
    core.shutdown().await.unwrap();

    let (restored, _audio) = spawn_with(config);
    let (_, tl_tracks) = restored.tl_tracks().await.unwrap();
    assert_eq!(tl_tracks, added);
}
