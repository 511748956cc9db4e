//! The playback core
//!
//! `Core` owns the tracklist, playback, history, mixer, library and
//! playlists controllers and is the only place where they meet. Every operation runs to
//! completion with exclusive access; wrap it in a `CoreHandle` to share it
//! between tasks.

use crate::config::CoreConfig;
use crate::error::Result;
use crate::events::{BackendEvent, CoreEvent, EventBus};
use crate::history::{History, HistoryEntry};
use crate::library::{Backends, LibraryController};
use crate::mixer::MixerController;
use crate::playback::{Context, Playback};
use crate::playlists::PlaylistsController;
use crate::state::{CoreState, StateStore, StoredState};
use crate::tracklist::Tracklist;
use crate::types::{Coverage, Criteria, TracklistOptions};
use lyra_core::{
    AudioEngine, AudioEvent, Mixer, PlaybackState, Playlist, Ref, SearchQuery, SearchResult,
    TlTrack, Tlid, Track,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Music server core
pub struct Core {
    config: CoreConfig,
    tracklist: Tracklist,
    playback: Playback,
    history: History,
    mixer: MixerController,
    library: LibraryController,
    playlists: PlaylistsController,
    backends: Arc<Backends>,
    audio: Arc<dyn AudioEngine>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("state", &self.playback.state())
            .field("tracklist_length", &self.tracklist.len())
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

impl Core {
    /// Create a core
    ///
    /// The audio engine's notifications must be routed to `on_audio_event`
    /// and `on_about_to_finish`; `CoreHandle::spawn` does this.
    pub fn new(
        config: CoreConfig,
        audio: Arc<dyn AudioEngine>,
        backends: Backends,
        mixer: Option<Arc<dyn Mixer>>,
    ) -> Result<Self> {
        config.validate()?;

        let backends = Arc::new(backends);
        let bus = Arc::new(EventBus::new());
        Ok(Self {
            tracklist: Tracklist::new(config.max_tracklist_length),
            playback: Playback::new(),
            history: History::new(config.history_max_size),
            mixer: MixerController::new(mixer),
            library: LibraryController::new(Arc::clone(&backends)),
            playlists: PlaylistsController::new(Arc::clone(&backends), Arc::clone(&bus)),
            backends,
            audio,
            bus,
            config,
        })
    }

    /// Event bus listeners register on
    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The audio engine driven by this core
    pub fn audio(&self) -> &Arc<dyn AudioEngine> {
        &self.audio
    }

    /// Configuration the core was created with
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Registered URI schemes
    pub fn uri_schemes(&self) -> Vec<String> {
        self.backends.uri_schemes()
    }

    fn parts(&mut self) -> (&mut Playback, Context<'_>) {
        (
            &mut self.playback,
            Context {
                tracklist: &mut self.tracklist,
                history: &mut self.history,
                backends: &self.backends,
                audio: self.audio.as_ref(),
                bus: self.bus.as_ref(),
            },
        )
    }

    // ===== Lifecycle =====

    /// Restore the saved state, if enabled
    ///
    /// Failures are logged; the core then starts empty.
    pub async fn setup(&mut self) {
        if !self.config.restore_state {
            return;
        }

        let store = StateStore::new(self.config.state_file());
        match store.load().await {
            Ok(Some(stored)) => {
                tracing::debug!("Restoring state saved by version {}", stored.version);
                self.load_state(stored.state, &Coverage::ALL).await;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Restore state: {}", e),
        }
    }

    /// Save the state, if enabled
    pub async fn teardown(&mut self) {
        if !self.config.restore_state {
            return;
        }

        let store = StateStore::new(self.config.state_file());
        let state = StoredState::new(self.save_state().await);
        if let Err(e) = store.save(&state).await {
            tracing::warn!("Unexpected error while saving state: {}", e);
        }
    }

    /// Snapshot of everything the core persists
    pub async fn save_state(&mut self) -> CoreState {
        let (playback, ctx) = self.parts();
        let playback = playback.save_state(&ctx).await;

        CoreState {
            tracklist: self.tracklist.save_state(),
            history: self.history.save_state(),
            playback,
            mixer: self.mixer.save_state().await,
        }
    }

    /// Restore the parts of `state` named in `coverage`
    ///
    /// Playback is resumed last, once the tracklist it refers to is back.
    pub async fn load_state(&mut self, state: CoreState, coverage: &[Coverage]) {
        let covers = |part: Coverage| coverage.contains(&part);

        if covers(Coverage::History) {
            self.history.load_state(state.history);
        }

        if covers(Coverage::Mode) {
            let options = state.tracklist.options;
            self.set_consume(options.consume);
            self.set_random(options.random);
            self.set_repeat(options.repeat);
            self.set_single(options.single);
        }

        if covers(Coverage::Tracklist) {
            self.tracklist
                .restore(state.tracklist.tl_tracks, state.tracklist.next_tlid);
            self.tracklist_changed().await;
        }

        if covers(Coverage::Mixer) {
            if let Some(volume) = state.mixer.volume {
                if let Err(e) = self.set_volume(volume).await {
                    tracing::warn!("Ignoring saved volume: {}", e);
                }
            }
            if let Some(mute) = state.mixer.mute {
                self.set_mute(mute).await;
            }
        }

        if covers(Coverage::PlayLast) {
            let (playback, mut ctx) = self.parts();
            playback.load_state(&mut ctx, state.playback).await;
        }
    }

    // ===== Tracklist =====

    /// Tracklist (read-only)
    pub fn tracklist(&self) -> &Tracklist {
        &self.tracklist
    }

    /// All entries in tracklist order
    pub fn tl_tracks(&self) -> Vec<TlTrack> {
        self.tracklist.tl_tracks().to_vec()
    }

    /// Tracklist mode flags
    pub fn options(&self) -> TracklistOptions {
        self.tracklist.options()
    }

    /// Entries matching `criteria`
    pub fn filter(&self, criteria: &Criteria) -> Vec<TlTrack> {
        self.tracklist.filter(criteria)
    }

    async fn tracklist_changed(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.on_tracklist_change(&mut ctx).await;
        self.bus.send(CoreEvent::TracklistChanged);
    }

    /// Insert tracks at `at_position`, or append them
    pub async fn add(
        &mut self,
        tracks: Vec<Track>,
        at_position: Option<usize>,
    ) -> Result<Vec<TlTrack>> {
        let added = self.tracklist.add(tracks, at_position)?;
        if !added.is_empty() {
            self.tracklist_changed().await;
        }
        Ok(added)
    }

    /// Look up URIs through the library and insert the resulting tracks
    ///
    /// Tracks keep the order of `uris`; URIs that resolve to nothing are
    /// skipped.
    pub async fn add_uris(
        &mut self,
        uris: &[String],
        at_position: Option<usize>,
    ) -> Result<Vec<TlTrack>> {
        let mut found = self.library.lookup(uris).await;
        let tracks: Vec<Track> = uris
            .iter()
            .filter_map(|uri| found.remove(uri))
            .flatten()
            .collect();
        self.add(tracks, at_position).await
    }

    /// Remove entries matching `criteria`
    pub async fn remove(&mut self, criteria: &Criteria) -> Vec<TlTrack> {
        let removed = self.tracklist.remove(criteria);
        if !removed.is_empty() {
            self.tracklist_changed().await;
        }
        removed
    }

    /// Remove every entry
    pub async fn clear(&mut self) {
        self.tracklist.clear();
        self.tracklist_changed().await;
    }

    /// Move the entries in `[start, end)` to `to_position`
    pub async fn move_range(&mut self, start: usize, end: usize, to_position: usize) -> Result<()> {
        self.tracklist.move_range(start, end, to_position)?;
        self.tracklist_changed().await;
        Ok(())
    }

    /// Shuffle the entries in `[start, end)`, or all of them
    pub async fn shuffle(&mut self, start: Option<usize>, end: Option<usize>) -> Result<()> {
        self.tracklist.shuffle(start, end)?;
        self.tracklist_changed().await;
        Ok(())
    }

    fn options_changed(&self, changed: bool) {
        if changed {
            self.bus.send(CoreEvent::OptionsChanged);
        }
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, value: bool) {
        let changed = self.tracklist.set_repeat(value);
        self.options_changed(changed);
    }

    /// Set random mode
    pub fn set_random(&mut self, value: bool) {
        let changed = self.tracklist.set_random(value);
        self.options_changed(changed);
    }

    /// Set single mode
    pub fn set_single(&mut self, value: bool) {
        let changed = self.tracklist.set_single(value);
        self.options_changed(changed);
    }

    /// Set consume mode
    pub fn set_consume(&mut self, value: bool) {
        let changed = self.tracklist.set_consume(value);
        self.options_changed(changed);
    }

    /// Tlid that would play when the current track finishes
    pub fn eot_tlid(&mut self) -> Option<Tlid> {
        let current = self.playback.current_tl_track().cloned();
        self.tracklist.eot_track(current.as_ref()).map(|tl| tl.tlid)
    }

    /// Tlid that `next` would play
    pub fn next_tlid(&mut self) -> Option<Tlid> {
        let current = self.playback.current_tl_track().cloned();
        self.tracklist.next_track(current.as_ref()).map(|tl| tl.tlid)
    }

    /// Tlid that `previous` would play
    pub fn previous_tlid(&self) -> Option<Tlid> {
        self.tracklist
            .previous_track(self.playback.current_tl_track())
            .map(|tl| tl.tlid)
    }

    // ===== Playback =====

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Force the playback state
    pub fn set_state(&mut self, state: PlaybackState) {
        let (playback, ctx) = self.parts();
        playback.set_state(&ctx, state);
    }

    /// Current entry
    pub fn current_tl_track(&self) -> Option<TlTrack> {
        self.playback.current_tl_track().cloned()
    }

    /// Entry handed to the engine but not started yet
    pub fn pending_tl_track(&self) -> Option<TlTrack> {
        self.playback.pending_tl_track().cloned()
    }

    /// Stream title of the current live stream
    pub fn stream_title(&self) -> Option<String> {
        self.playback.stream_title().map(str::to_string)
    }

    /// Position in the current track, in milliseconds
    pub async fn time_position(&mut self) -> u64 {
        let (playback, ctx) = self.parts();
        playback.time_position(&ctx).await
    }

    /// Play `tlid`, or resume / start from the current entry
    pub async fn play(&mut self, tlid: Option<Tlid>) {
        let (playback, mut ctx) = self.parts();
        playback.play(&mut ctx, tlid).await;
    }

    /// Pause playback
    pub async fn pause(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.pause(&mut ctx).await;
    }

    /// Resume paused playback
    pub async fn resume(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.resume(&mut ctx).await;
    }

    /// Stop playback
    pub async fn stop(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.stop(&mut ctx).await;
    }

    /// Skip to the next track
    pub async fn next(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.next(&mut ctx).await;
    }

    /// Skip to the previous track
    pub async fn previous(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.previous(&mut ctx).await;
    }

    /// Seek to `position` milliseconds; returns whether the seek was accepted
    pub async fn seek(&mut self, position: i64) -> bool {
        let (playback, mut ctx) = self.parts();
        playback.seek(&mut ctx, position).await
    }

    // ===== Engine notifications =====

    /// Handle a notification from the audio engine
    pub async fn on_audio_event(&mut self, event: AudioEvent) {
        tracing::trace!("Audio event: {}", event.name());
        let (playback, mut ctx) = self.parts();
        playback.on_audio_event(&mut ctx, event).await;
    }

    /// The engine is about to finish the current stream
    pub async fn on_about_to_finish(&mut self) {
        let (playback, mut ctx) = self.parts();
        playback.on_about_to_finish(&mut ctx).await;
    }

    /// Relay a backend notification to listeners
    pub fn on_backend_event(&self, event: BackendEvent) {
        self.bus.send(event.into());
    }

    // ===== History =====

    /// Played tracks, most recent first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Number of history entries
    pub fn history_length(&self) -> usize {
        self.history.len()
    }

    // ===== Mixer =====

    /// Mixer volume
    pub async fn get_volume(&self) -> Option<u8> {
        self.mixer.get_volume().await
    }

    /// Set the mixer volume
    pub async fn set_volume(&mut self, volume: u8) -> Result<bool> {
        let accepted = self.mixer.set_volume(volume).await?;
        if accepted {
            self.bus.send(CoreEvent::VolumeChanged { volume });
        }
        Ok(accepted)
    }

    /// Mixer mute state
    pub async fn get_mute(&self) -> Option<bool> {
        self.mixer.get_mute().await
    }

    /// Mute or unmute the mixer
    pub async fn set_mute(&mut self, mute: bool) -> bool {
        let accepted = self.mixer.set_mute(mute).await;
        if accepted {
            self.bus.send(CoreEvent::MuteChanged { mute });
        }
        accepted
    }

    // ===== Library =====

    /// Resolve URIs to tracks
    pub async fn lookup(&self, uris: &[String]) -> HashMap<String, Vec<Track>> {
        self.library.lookup(uris).await
    }

    /// Browse a directory, or the backends' roots
    pub async fn browse(&self, uri: Option<&str>) -> Vec<Ref> {
        self.library.browse(uri).await
    }

    /// Search the libraries, optionally limited to `uris`
    pub async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> Vec<SearchResult> {
        self.library.search(query, uris, exact).await
    }

    // ===== Playlists =====

    /// Playlists controller
    pub fn playlists(&self) -> &PlaylistsController {
        &self.playlists
    }

    /// References to every playlist
    pub async fn playlists_as_list(&self) -> Vec<Ref> {
        self.playlists.as_list().await
    }

    /// Items of a playlist
    pub async fn playlist_items(&self, uri: &str) -> Result<Option<Vec<Ref>>> {
        self.playlists.get_items(uri).await
    }

    /// Look up a playlist
    pub async fn lookup_playlist(&self, uri: &str) -> Option<Playlist> {
        self.playlists.lookup(uri).await
    }

    /// Create a playlist
    pub async fn create_playlist(&self, name: &str, uri_scheme: Option<&str>) -> Option<Playlist> {
        self.playlists.create(name, uri_scheme).await
    }

    /// Save a playlist
    pub async fn save_playlist(&self, playlist: Playlist) -> Option<Playlist> {
        self.playlists.save(playlist).await
    }

    /// Delete a playlist
    pub async fn delete_playlist(&self, uri: &str) -> Result<bool> {
        self.playlists.delete(uri).await
    }

    /// Reload playlists
    pub async fn refresh_playlists(&self, uri_scheme: Option<&str>) {
        self.playlists.refresh(uri_scheme).await;
    }
}
