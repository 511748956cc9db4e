//! In-memory audio engine and backend
//!
//! `DummyAudio` behaves like a real engine as far as the core can tell: it
//! keeps a URI, a position and a state, and reports every change as an
//! `AudioEvent`. Nothing is decoded. It serves as the null output of the
//! server and as the engine in tests, where its events can be buffered and
//! replayed one by one.

use async_trait::async_trait;
use lyra_core::{
    AudioEngine, AudioEvent, AudioEventSink, Backend, LibraryProvider, LyraError, PlaybackProvider,
    PlaybackState, Playlist, PlaylistsProvider, Ref, SearchQuery, SearchResult,
    SourceSetupCallback, Tags, Track,
};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct DummyState {
    state: PlaybackState,
    position: u64,
    uri: Option<String>,
    stream_changed: bool,
    live_stream: bool,
    tags: Tags,
    bad_uris: HashSet<String>,
    source_setup_callback: Option<SourceSetupCallback>,
    sink: Option<Arc<dyn AudioEventSink>>,
    /// Events emitted while no sink is registered
    buffered: VecDeque<AudioEvent>,
}

/// Audio engine that plays nothing
#[derive(Default)]
pub struct DummyAudio {
    inner: Mutex<DummyState>,
}

impl std::fmt::Debug for DummyAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("DummyAudio")
            .field("state", &inner.state)
            .field("uri", &inner.uri)
            .field("position", &inner.position)
            .finish()
    }
}

impl DummyAudio {
    /// Create an engine without a sink; events are buffered until one is set
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DummyState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_all(&self, events: Vec<AudioEvent>) {
        let sink = {
            let mut inner = self.lock();
            match inner.sink.clone() {
                Some(sink) => sink,
                None => {
                    inner.buffered.extend(events);
                    return;
                }
            }
        };
        for event in events {
            sink.emit(event);
        }
    }

    fn change_state(&self, new_state: PlaybackState) -> lyra_core::Result<()> {
        let mut events = Vec::new();
        let result = {
            let mut inner = self.lock();
            if inner.uri.is_none() {
                return Err(LyraError::audio("No URI set"));
            }

            if new_state == PlaybackState::Stopped {
                inner.stream_changed = true;
                inner.uri = None;
            }
            if inner.stream_changed {
                inner.stream_changed = false;
                events.push(AudioEvent::StreamChanged {
                    uri: inner.uri.clone(),
                });
            }
            if inner.uri.is_some() {
                events.push(AudioEvent::PositionChanged { position: 0 });
            }

            let old_state = inner.state;
            inner.state = new_state;
            events.push(AudioEvent::StateChanged {
                old_state,
                new_state,
                target_state: None,
            });

            if new_state == PlaybackState::Playing {
                inner
                    .tags
                    .insert("audio-codec".to_string(), vec!["fake info...".to_string()]);
                events.push(AudioEvent::TagsChanged {
                    tags: vec!["audio-codec".to_string()],
                });
            }

            match &inner.uri {
                Some(uri) if inner.bad_uris.contains(uri) => {
                    Err(LyraError::audio(format!("Failed to play {uri}")))
                }
                _ => Ok(()),
            }
        };

        self.emit_all(events);
        result
    }

    // ===== Test controls =====

    /// Take the events emitted while no sink was registered
    pub fn take_events(&self) -> Vec<AudioEvent> {
        self.lock().buffered.drain(..).collect()
    }

    /// Make every later attempt to play `uri` fail
    pub fn trigger_fake_playback_failure(&self, uri: impl Into<String>) {
        self.lock().bad_uris.insert(uri.into());
    }

    /// Merge tags into the current stream and announce them
    pub fn trigger_fake_tags_changed(&self, tags: Tags) {
        let mut names: Vec<String> = tags.keys().cloned().collect();
        names.sort();
        self.lock().tags.extend(tags);
        self.emit_all(vec![AudioEvent::TagsChanged { tags: names }]);
    }

    /// Start an about-to-finish round
    ///
    /// The engine forgets its URI; the core is expected to set the next one.
    pub fn begin_about_to_finish(&self) {
        let mut inner = self.lock();
        inner.uri = None;
        inner.source_setup_callback = None;
    }

    /// Finish an about-to-finish round
    ///
    /// Announces the stream queued by the core during the round, or the end
    /// of the stream if nothing was queued.
    pub fn finish_about_to_finish(&self) {
        let events = {
            let mut inner = self.lock();
            match inner.uri.clone() {
                Some(uri) => {
                    inner.position = 0;
                    inner.stream_changed = false;
                    vec![
                        AudioEvent::PositionChanged { position: 0 },
                        AudioEvent::StreamChanged { uri: Some(uri) },
                    ]
                }
                None => {
                    inner.tags.clear();
                    inner.state = PlaybackState::Stopped;
                    vec![AudioEvent::ReachedEndOfStream]
                }
            }
        };
        self.emit_all(events);
    }

    /// Pretend the current stream is about to end
    ///
    /// Asks the registered sink for the follow-up URI, then reports the
    /// stream change or end of stream like a real engine would.
    pub async fn simulate_track_end(&self) {
        self.begin_about_to_finish();
        let sink = self.lock().sink.clone();
        if let Some(sink) = sink {
            sink.about_to_finish().await;
        }
        self.finish_about_to_finish();
    }

    /// Engine state
    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    /// URI the engine is reading
    pub fn uri(&self) -> Option<String> {
        self.lock().uri.clone()
    }

    /// Whether the current URI was set as a live stream
    pub fn is_live_stream(&self) -> bool {
        self.lock().live_stream
    }

    /// Whether a source setup callback is registered
    pub fn has_source_setup_callback(&self) -> bool {
        self.lock().source_setup_callback.is_some()
    }
}

#[async_trait]
impl AudioEngine for DummyAudio {
    fn set_event_sink(&self, sink: Arc<dyn AudioEventSink>) {
        let buffered: Vec<AudioEvent> = {
            let mut inner = self.lock();
            inner.sink = Some(Arc::clone(&sink));
            inner.buffered.drain(..).collect()
        };
        for event in buffered {
            sink.emit(event);
        }
    }

    async fn prepare_change(&self) -> lyra_core::Result<()> {
        let mut inner = self.lock();
        inner.uri = None;
        inner.source_setup_callback = None;
        Ok(())
    }

    async fn set_uri(
        &self,
        uri: &str,
        live_stream: bool,
        _download: bool,
    ) -> lyra_core::Result<()> {
        let mut inner = self.lock();
        if inner.uri.is_some() {
            return Err(LyraError::audio("prepare_change was not called before set_uri"));
        }
        inner.position = 0;
        inner.uri = Some(uri.to_string());
        inner.stream_changed = true;
        inner.live_stream = live_stream;
        inner.tags.clear();
        Ok(())
    }

    async fn set_source_setup_callback(
        &self,
        callback: Option<SourceSetupCallback>,
    ) -> lyra_core::Result<()> {
        self.lock().source_setup_callback = callback;
        Ok(())
    }

    async fn start_playback(&self) -> lyra_core::Result<()> {
        self.change_state(PlaybackState::Playing)
    }

    async fn pause_playback(&self) -> lyra_core::Result<()> {
        self.change_state(PlaybackState::Paused)
    }

    async fn stop_playback(&self) -> lyra_core::Result<()> {
        self.change_state(PlaybackState::Stopped)
    }

    async fn get_position(&self) -> lyra_core::Result<u64> {
        Ok(self.lock().position)
    }

    async fn set_position(&self, position: u64) -> lyra_core::Result<()> {
        self.lock().position = position;
        self.emit_all(vec![AudioEvent::PositionChanged { position }]);
        Ok(())
    }

    async fn get_current_tags(&self) -> lyra_core::Result<Tags> {
        Ok(self.lock().tags.clone())
    }
}

/// Backend serving a fixed set of tracks under one scheme
///
/// URIs containing `error` fail to translate and URIs containing
/// `unplayable` translate to nothing. `limit_never` URIs are never playable
/// and `limit_one` URIs are playable exactly once.
///
/// Playlists live in memory under `<scheme>:playlist:<name>`.
#[derive(Debug)]
pub struct DummyBackend {
    scheme: String,
    tracks: Vec<Track>,
    playlists: Mutex<BTreeMap<String, Playlist>>,
    translations: AtomicUsize,
    limit_one_used: AtomicBool,
}

impl DummyBackend {
    /// Create a backend for `scheme` with no tracks
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            tracks: Vec::new(),
            playlists: Mutex::new(BTreeMap::new()),
            translations: AtomicUsize::new(0),
            limit_one_used: AtomicBool::new(false),
        }
    }

    /// Serve these tracks from `lookup`
    #[must_use]
    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    /// Start with these playlists
    #[must_use]
    pub fn with_playlists(self, playlists: Vec<Playlist>) -> Self {
        self.store().extend(
            playlists
                .into_iter()
                .map(|playlist| (playlist.uri.clone(), playlist)),
        );
        self
    }

    fn store(&self) -> MutexGuard<'_, BTreeMap<String, Playlist>> {
        self.playlists.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `translate_uri` calls so far
    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }
}

impl Backend for DummyBackend {
    fn name(&self) -> &str {
        "dummy"
    }

    fn uri_schemes(&self) -> Vec<String> {
        vec![self.scheme.clone()]
    }

    fn library(&self) -> Option<&dyn LibraryProvider> {
        Some(self)
    }

    fn playback(&self) -> Option<&dyn PlaybackProvider> {
        Some(self)
    }

    fn playlists(&self) -> Option<&dyn PlaylistsProvider> {
        Some(self)
    }
}

#[async_trait]
impl LibraryProvider for DummyBackend {
    fn root_directory(&self) -> Option<Ref> {
        Some(Ref::directory(format!("{}:/", self.scheme), self.scheme.clone()))
    }

    async fn browse(&self, uri: &str) -> lyra_core::Result<Vec<Ref>> {
        if uri != format!("{}:/", self.scheme) {
            return Ok(Vec::new());
        }
        Ok(self
            .tracks
            .iter()
            .map(|track| Ref::track(track.uri.clone(), track.display_name()))
            .collect())
    }

    async fn lookup(&self, uri: &str) -> lyra_core::Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|track| track.uri == uri)
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> lyra_core::Result<Option<SearchResult>> {
        let tracks = self
            .tracks
            .iter()
            .filter(|track| match uris {
                Some(roots) => roots.iter().any(|root| track.uri.starts_with(root.as_str())),
                None => true,
            })
            .filter(|track| query.matches(track, exact))
            .cloned()
            .collect();
        Ok(Some(SearchResult {
            uri: Some(format!("{}:search", self.scheme)),
            tracks,
            ..SearchResult::default()
        }))
    }
}

#[async_trait]
impl PlaylistsProvider for DummyBackend {
    async fn as_list(&self) -> lyra_core::Result<Vec<Ref>> {
        Ok(self
            .store()
            .values()
            .map(|playlist| {
                Ref::playlist(playlist.uri.clone(), playlist.name.clone().unwrap_or_default())
            })
            .collect())
    }

    async fn get_items(&self, uri: &str) -> lyra_core::Result<Option<Vec<Ref>>> {
        Ok(self.store().get(uri).map(|playlist| {
            playlist
                .tracks
                .iter()
                .map(|track| Ref::track(track.uri.clone(), track.display_name()))
                .collect()
        }))
    }

    async fn lookup(&self, uri: &str) -> lyra_core::Result<Option<Playlist>> {
        Ok(self.store().get(uri).cloned())
    }

    async fn create(&self, name: &str) -> lyra_core::Result<Option<Playlist>> {
        let playlist = Playlist::new(format!("{}:playlist:{}", self.scheme, name), name);
        self.store().insert(playlist.uri.clone(), playlist.clone());
        Ok(Some(playlist))
    }

    async fn save(&self, playlist: Playlist) -> lyra_core::Result<Option<Playlist>> {
        let mut store = self.store();
        if !store.contains_key(&playlist.uri) {
            return Ok(None);
        }
        store.insert(playlist.uri.clone(), playlist.clone());
        Ok(Some(playlist))
    }

    async fn delete(&self, uri: &str) -> lyra_core::Result<bool> {
        Ok(self.store().remove(uri).is_some())
    }
}

#[async_trait]
impl PlaybackProvider for DummyBackend {
    async fn translate_uri(&self, uri: &str) -> lyra_core::Result<Option<String>> {
        self.translations.fetch_add(1, Ordering::SeqCst);

        if uri.contains("error") {
            return Err(LyraError::backend(format!("Failed to translate {uri}")));
        }
        if uri.contains("unplayable") || uri.contains("limit_never") {
            return Ok(None);
        }
        if uri.contains("limit_one") && self.limit_one_used.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(uri.to_string()))
    }

    fn is_live(&self, uri: &str) -> bool {
        uri.contains("live")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_play_emits_stream_change_then_state() {
        let audio = DummyAudio::new();
        audio.prepare_change().await.unwrap();
        audio.set_uri("dummy:a", false, false).await.unwrap();
        audio.start_playback().await.unwrap();

        let events = audio.take_events();
        assert_eq!(
            events[0],
            AudioEvent::StreamChanged {
                uri: Some("dummy:a".to_string())
            }
        );
        assert_eq!(events[1], AudioEvent::PositionChanged { position: 0 });
        assert!(matches!(
            events[2],
            AudioEvent::StateChanged {
                new_state: PlaybackState::Playing,
                ..
            }
        ));
        assert_eq!(audio.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_set_uri_requires_prepare_change() {
        let audio = DummyAudio::new();
        audio.set_uri("dummy:a", false, false).await.unwrap();
        assert!(audio.set_uri("dummy:b", false, false).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_uri_still_reports_events() {
        let audio = DummyAudio::new();
        audio.trigger_fake_playback_failure("dummy:bad");
        audio.set_uri("dummy:bad", false, false).await.unwrap();

        assert!(audio.start_playback().await.is_err());
        assert!(!audio.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_stop_releases_stream() {
        let audio = DummyAudio::new();
        audio.set_uri("dummy:a", false, false).await.unwrap();
        audio.start_playback().await.unwrap();
        audio.take_events();

        audio.stop_playback().await.unwrap();
        assert_eq!(audio.uri(), None);
        assert_eq!(audio.take_events()[0], AudioEvent::StreamChanged { uri: None });
    }

    #[tokio::test]
    async fn test_translate_rules() {
        let backend = DummyBackend::new("dummy");
        assert!(backend.translate_uri("dummy:error").await.is_err());
        assert_eq!(backend.translate_uri("dummy:unplayable").await.unwrap(), None);
        assert!(backend.translate_uri("dummy:limit_one").await.unwrap().is_some());
        assert_eq!(backend.translate_uri("dummy:limit_one").await.unwrap(), None);
        assert_eq!(backend.translations(), 4);
    }
}
