//! Playback state machine
//!
//! Drives the audio engine through track changes and reconciles the engine's
//! asynchronous notifications with the core's view of what is playing.
//!
//! A track change is two-phase: commands only stage a *pending* track and
//! hand its URI to the engine. The pending track becomes *current* once the
//! engine reports a `stream_changed` for that exact URI. Notifications for
//! any other URI belong to a change that has since been superseded and are
//! ignored.

use crate::events::{CoreEvent, EventBus};
use crate::history::History;
use crate::library::Backends;
use crate::state::PlaybackSnapshot;
use crate::tracklist::Tracklist;
use lyra_core::{AudioEngine, AudioEvent, PlaybackState, TlTrack, Tlid};

/// Everything a playback operation may touch besides its own state
pub(crate) struct Context<'a> {
    pub tracklist: &'a mut Tracklist,
    pub history: &'a mut History,
    pub backends: &'a Backends,
    pub audio: &'a dyn AudioEngine,
    pub bus: &'a EventBus,
}

/// Playback controller state
#[derive(Debug, Default)]
pub struct Playback {
    state: PlaybackState,
    current: Option<TlTrack>,
    /// Ended event already sent for `current`
    current_ended: bool,

    pending: Option<TlTrack>,
    /// Engine URI the pending track was handed over as
    pending_uri: Option<String>,
    /// State to enter once the pending track is promoted
    pending_state: PlaybackState,

    /// Seek to apply once the engine confirms the stream position
    pending_position: Option<u64>,
    /// Position of the outgoing track, captured before a change
    last_position: Option<u64>,

    /// The running change came from `previous`; the outgoing track is not
    /// marked as played
    previous: bool,

    /// Used when restoring a saved playback position
    start_at_position: Option<u64>,
    start_paused: bool,

    stream_title: Option<String>,
}

impl Playback {
    /// Create a stopped controller
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Queries =====

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Track currently playing (or paused)
    pub fn current_tl_track(&self) -> Option<&TlTrack> {
        self.current.as_ref()
    }

    /// Track handed to the engine that has not started yet
    pub fn pending_tl_track(&self) -> Option<&TlTrack> {
        self.pending.as_ref()
    }

    /// Title reported by a live stream, if it differs from the track name
    pub fn stream_title(&self) -> Option<&str> {
        self.stream_title.as_deref()
    }

    /// Position in the current track, in milliseconds
    ///
    /// A seek waiting to land reports its target position.
    pub(crate) async fn time_position(&self, ctx: &Context<'_>) -> u64 {
        if let Some(position) = self.pending_position {
            return position;
        }
        let Some(current) = &self.current else {
            return 0;
        };
        if ctx.backends.playback_for(&current.track.uri).is_none() {
            return 0;
        }
        match ctx.audio.get_position().await {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!("Failed to get time position: {}", e);
                0
            }
        }
    }

    /// Force the playback state, emitting `playback_state_changed`
    pub(crate) fn set_state(&mut self, ctx: &Context<'_>, new_state: PlaybackState) {
        let old_state = self.state;
        self.state = new_state;

        tracing::debug!("Changing state: {} -> {}", old_state, new_state);
        ctx.bus.send(CoreEvent::PlaybackStateChanged {
            old_state,
            new_state,
        });
    }

    fn has_backend(ctx: &Context<'_>, tl_track: Option<&TlTrack>) -> bool {
        tl_track.is_some_and(|tl| ctx.backends.playback_for(&tl.track.uri).is_some())
    }

    // ===== Commands =====

    /// Play the given entry, or resume / restart from the current one
    ///
    /// Unplayable entries are skipped in `next_track` order.
    ///
    /// An unknown `tlid` is treated like no `tlid` at all.
    pub(crate) async fn play(&mut self, ctx: &mut Context<'_>, tlid: Option<Tlid>) {
        let requested = tlid.and_then(|tlid| {
            let found = ctx.tracklist.get(tlid).cloned();
            if found.is_none() {
                tracing::info!("Tried to play unknown tlid {}", tlid);
            }
            found
        });

        if requested.is_none() && self.state == PlaybackState::Paused {
            self.resume(ctx).await;
            return;
        }

        let mut pending = requested
            .or_else(|| self.pending.clone())
            .or_else(|| self.current.clone())
            .or_else(|| ctx.tracklist.next_track(None));

        let mut attempts = ctx.tracklist.len().saturating_mul(2);
        let mut failed = false;
        while let Some(tl_track) = pending {
            if self.change(ctx, Some(tl_track.clone()), PlaybackState::Playing).await {
                return;
            }
            failed = true;
            self.mark_unplayable(ctx, &tl_track).await;
            pending = ctx.tracklist.next_track(Some(&tl_track));

            attempts = attempts.saturating_sub(1);
            if attempts == 0 {
                tracing::info!("No playable track in the list");
                break;
            }
        }

        if failed {
            self.give_up(ctx).await;
        }
    }

    /// Skip to the next track, keeping the playback state
    pub(crate) async fn next(&mut self, ctx: &mut Context<'_>) {
        self.skip(ctx, false).await;
    }

    /// Skip to the previous track, keeping the playback state
    ///
    /// The outgoing track is not marked as played.
    pub(crate) async fn previous(&mut self, ctx: &mut Context<'_>) {
        self.previous = true;
        self.skip(ctx, true).await;
        // Only a change still waiting for its stream change needs the flag
        if self.pending.is_none() {
            self.previous = false;
        }
    }

    /// Step away from the pending track, or the current one
    ///
    /// A change that has not reached the engine yet keeps the state it was
    /// started with.
    async fn skip(&mut self, ctx: &mut Context<'_>, backwards: bool) {
        let state = if self.pending.is_some() {
            self.pending_state
        } else {
            self.state
        };
        let mut current = self.pending.clone().or_else(|| self.current.clone());
        let mut attempts = ctx.tracklist.len().saturating_mul(2);

        while let Some(reference) = current {
            let candidate = if backwards {
                ctx.tracklist.previous_track(Some(&reference))
            } else {
                ctx.tracklist.next_track(Some(&reference))
            };

            // change(None) stops playback and always succeeds
            if self.change(ctx, candidate.clone(), state).await {
                return;
            }
            let Some(candidate) = candidate else {
                return;
            };
            self.mark_unplayable(ctx, &candidate).await;
            current = Some(candidate);

            attempts = attempts.saturating_sub(1);
            if attempts == 0 {
                tracing::info!("No playable track in the list");
                self.give_up(ctx).await;
                return;
            }
        }
    }

    /// Pause playback
    pub(crate) async fn pause(&mut self, ctx: &mut Context<'_>) {
        let paused = if Self::has_backend(ctx, self.current.as_ref()) {
            match ctx.audio.pause_playback().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to pause: {}", e);
                    false
                }
            }
        } else {
            true
        };

        if paused {
            self.set_state(ctx, PlaybackState::Paused);
            self.trigger_paused(ctx).await;
        }
    }

    /// Resume paused playback; does nothing unless paused
    pub(crate) async fn resume(&mut self, ctx: &mut Context<'_>) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if !Self::has_backend(ctx, self.current.as_ref()) {
            return;
        }
        if let Err(e) = ctx.audio.start_playback().await {
            tracing::warn!("Failed to resume: {}", e);
            return;
        }
        self.set_state(ctx, PlaybackState::Playing);
        self.trigger_resumed(ctx).await;
    }

    /// Stop playback, cancelling any pending change
    pub(crate) async fn stop(&mut self, ctx: &mut Context<'_>) {
        if self.state == PlaybackState::Stopped && self.pending.is_none() {
            return;
        }

        self.last_position = Some(self.time_position(ctx).await);

        let target = self.current.as_ref().or(self.pending.as_ref());
        if Self::has_backend(ctx, target) {
            if let Err(e) = ctx.audio.stop_playback().await {
                tracing::warn!("Failed to stop: {}", e);
                return;
            }
        }

        self.pending = None;
        self.pending_uri = None;
        self.pending_position = None;
        self.previous = false;
        self.set_state(ctx, PlaybackState::Stopped);
    }

    /// Seek in the current track; returns whether the seek was accepted
    ///
    /// Negative positions are clamped to zero, positions past the end skip
    /// to the next track.
    pub(crate) async fn seek(&mut self, ctx: &mut Context<'_>, position: i64) -> bool {
        let position = u64::try_from(position).unwrap_or_else(|_| {
            tracing::debug!("Client seeked to negative position, seeking to zero");
            0
        });

        if ctx.tracklist.is_empty() {
            return false;
        }

        if self.state == PlaybackState::Stopped {
            self.play(ctx, None).await;
        }

        let Some(tl_track) = self.current.clone().or_else(|| self.pending.clone()) else {
            return false;
        };
        let Some(length) = tl_track.track.length else {
            return false;
        };

        if position > length {
            self.next(ctx).await;
            return true;
        }

        // Applied once the engine reports the stream position
        self.pending_position = Some(position);

        match (self.current.clone(), self.pending.is_some()) {
            // A gapless change is in flight: go back to the current track
            (Some(current), true) => {
                let state = self.state;
                self.change(ctx, Some(current), state).await
            }
            // Deferred until the pending track starts
            (None, true) => true,
            _ => self.seek_engine(ctx, position).await,
        }
    }

    async fn seek_engine(&mut self, ctx: &Context<'_>, position: u64) -> bool {
        if !Self::has_backend(ctx, self.current.as_ref()) {
            self.pending_position = None;
            return false;
        }
        match ctx.audio.set_position(position).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to seek to {}: {}", position, e);
                self.pending_position = None;
                false
            }
        }
    }

    // ===== Track changes =====

    /// Stage `pending` and hand it to the engine
    ///
    /// `None` stops playback and finishes the current track.
    async fn change(
        &mut self,
        ctx: &mut Context<'_>,
        pending: Option<TlTrack>,
        state: PlaybackState,
    ) -> bool {
        self.pending.clone_from(&pending);
        self.pending_uri = None;
        self.pending_state = state;

        let Some(tl_track) = pending else {
            self.stop(ctx).await;
            self.on_end_of_stream(ctx).await;
            return true;
        };

        if ctx.backends.playback_for(&tl_track.track.uri).is_none() {
            return false;
        }

        self.last_position = Some(self.time_position(ctx).await);

        if let Err(e) = ctx.audio.prepare_change().await {
            tracing::warn!("Failed to prepare track change: {}", e);
            return false;
        }
        if !self.change_track(ctx, &tl_track).await {
            return false;
        }

        let started = match state {
            PlaybackState::Playing => ctx.audio.start_playback().await,
            PlaybackState::Paused => ctx.audio.pause_playback().await,
            PlaybackState::Stopped => {
                // Nothing will be streamed, so there is no stream change to wait for
                self.current = self.pending.take();
                self.current_ended = false;
                self.pending_uri = None;
                self.previous = false;
                return true;
            }
        };

        match started {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to start {}: {}", tl_track.track.uri, e);
                false
            }
        }
    }

    /// Resolve the playable URI and give it to the engine
    async fn change_track(&mut self, ctx: &Context<'_>, tl_track: &TlTrack) -> bool {
        let uri = &tl_track.track.uri;
        let Some(provider) = ctx.backends.playback_for(uri) else {
            return false;
        };

        let translated = match provider.translate_uri(uri).await {
            Ok(Some(translated)) => translated,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Failed to translate {}: {}", uri, e);
                return false;
            }
        };

        tracing::debug!("Changing track to {} ({})", uri, translated);

        if let Err(e) = ctx
            .audio
            .set_source_setup_callback(provider.source_setup_callback())
            .await
        {
            tracing::warn!("Failed to set source setup callback: {}", e);
            return false;
        }
        if let Err(e) = ctx
            .audio
            .set_uri(
                &translated,
                provider.is_live(&translated),
                provider.should_download(&translated),
            )
            .await
        {
            tracing::warn!("Failed to set URI {}: {}", translated, e);
            return false;
        }

        self.pending_uri = Some(translated);
        true
    }

    async fn mark_unplayable(&mut self, ctx: &mut Context<'_>, tl_track: &TlTrack) {
        if ctx.tracklist.mark_unplayable(tl_track) {
            self.on_tracklist_change(ctx).await;
            ctx.bus.send(CoreEvent::TracklistChanged);
        }
    }

    /// Every candidate failed
    async fn give_up(&mut self, ctx: &mut Context<'_>) {
        self.stop(ctx).await;
        if self.state != PlaybackState::Stopped {
            self.set_state(ctx, PlaybackState::Stopped);
        }
        self.previous = false;
        self.current = None;
        self.pending = None;
        self.pending_uri = None;
    }

    // ===== Engine notifications =====

    /// Dispatch an engine notification
    pub(crate) async fn on_audio_event(&mut self, ctx: &mut Context<'_>, event: AudioEvent) {
        match event {
            AudioEvent::PositionChanged { position } => {
                self.on_position_changed(ctx, position).await;
            }
            AudioEvent::StreamChanged { uri } => self.on_stream_changed(ctx, uri).await,
            AudioEvent::StateChanged {
                new_state,
                target_state,
                ..
            } => self.on_engine_state_changed(ctx, new_state, target_state).await,
            AudioEvent::TagsChanged { tags } => self.on_tags_changed(ctx, &tags).await,
            AudioEvent::ReachedEndOfStream => self.on_end_of_stream(ctx).await,
        }
    }

    async fn on_position_changed(&mut self, ctx: &mut Context<'_>, position: u64) {
        tracing::trace!("Engine position changed to {}", position);

        if let Some(time_position) = self.pending_position.take() {
            ctx.bus.send(CoreEvent::Seeked { time_position });

            if self.start_paused {
                self.start_paused = false;
                self.pause(ctx).await;
            }
        }
    }

    async fn on_stream_changed(&mut self, ctx: &mut Context<'_>, uri: Option<String>) {
        let Some(uri) = uri else {
            // Engine released the stream: the outgoing track is over
            let position = self.outgoing_position(ctx).await;
            self.trigger_ended(ctx, position).await;
            self.stream_title = None;
            return;
        };

        if self.pending.is_none() || self.pending_uri.as_deref() != Some(uri.as_str()) {
            tracing::debug!("Ignoring stale stream change to {}", uri);
            return;
        }

        let position = self.outgoing_position(ctx).await;
        if self.pending_position.is_none() {
            self.trigger_ended(ctx, position).await;
        }
        self.stream_title = None;

        let previous_tlid = self.current.as_ref().map(|tl| tl.tlid);
        self.current = self.pending.take();
        self.current_ended = false;
        self.pending_uri = None;
        self.previous = false;
        let target = self.pending_state;

        match self.pending_position {
            None => {
                self.set_state(ctx, target);
                self.trigger_started(ctx);

                let mut seeked = false;
                if let Some(position) = self.start_at_position.take() {
                    if position > 0 {
                        seeked = self.seek(ctx, i64::try_from(position).unwrap_or(i64::MAX)).await;
                    }
                }
                if !seeked && self.start_paused {
                    self.start_paused = false;
                    self.pause(ctx).await;
                }
            }
            Some(position) => {
                self.last_position = None;
                self.seek_engine(ctx, position).await;
                if self.current.as_ref().map(|tl| tl.tlid) != previous_tlid {
                    self.set_state(ctx, target);
                    self.trigger_started(ctx);
                }
            }
        }
    }

    async fn on_engine_state_changed(
        &mut self,
        ctx: &mut Context<'_>,
        new_state: PlaybackState,
        target_state: Option<PlaybackState>,
    ) {
        // The engine paused on its own (e.g. buffering)
        if new_state == PlaybackState::Paused
            && target_state.is_none()
            && self.state != PlaybackState::Paused
        {
            self.set_state(ctx, PlaybackState::Paused);
            self.trigger_paused(ctx).await;
        }
    }

    async fn on_tags_changed(&mut self, ctx: &mut Context<'_>, tags: &[String]) {
        if !tags.iter().any(|tag| tag == "title") {
            return;
        }

        let current_tags = match ctx.audio.get_current_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!("Failed to get stream tags: {}", e);
                return;
            }
        };
        if current_tags.is_empty() {
            return;
        }

        self.stream_title = None;
        let Some(title) = current_tags.get("title").and_then(|values| values.first()) else {
            return;
        };
        let Some(current) = &self.current else {
            return;
        };
        if current.track.name.as_deref() != Some(title.as_str()) {
            self.stream_title = Some(title.clone());
            ctx.bus.send(CoreEvent::StreamTitleChanged {
                title: title.clone(),
            });
        }
    }

    pub(crate) async fn on_end_of_stream(&mut self, ctx: &mut Context<'_>) {
        self.set_state(ctx, PlaybackState::Stopped);
        if self.current.is_some() {
            let position = self.outgoing_position(ctx).await;
            self.trigger_ended(ctx, position).await;
        }
        self.current = None;
    }

    /// The engine is about to run out of data; queue the follow-up track
    pub(crate) async fn on_about_to_finish(&mut self, ctx: &mut Context<'_>) {
        if self.state == PlaybackState::Stopped {
            return;
        }

        if let Some(current) = &self.current {
            self.last_position = current.track.length;
        }

        let mut pending = ctx.tracklist.eot_track(self.current.as_ref());
        let mut attempts = ctx.tracklist.len().saturating_mul(2);

        while let Some(tl_track) = pending {
            if self.change_track(ctx, &tl_track).await {
                self.pending = Some(tl_track);
                self.pending_state = PlaybackState::Playing;
                return;
            }
            self.mark_unplayable(ctx, &tl_track).await;
            pending = ctx.tracklist.eot_track(Some(&tl_track));

            attempts = attempts.saturating_sub(1);
            if attempts == 0 {
                tracing::info!("No playable track in the list");
                return;
            }
        }
    }

    /// React to a tracklist mutation
    pub(crate) async fn on_tracklist_change(&mut self, ctx: &mut Context<'_>) {
        if ctx.tracklist.is_empty() {
            self.stop(ctx).await;
            self.current = None;
            return;
        }

        let current_tlid = self.current.as_ref().map(|tl| tl.tlid);
        if let Some(tlid) = current_tlid {
            if ctx.tracklist.get(tlid).is_none() {
                self.current = None;
            }
        }
    }

    async fn outgoing_position(&mut self, ctx: &Context<'_>) -> u64 {
        match self.last_position.take() {
            Some(position) => position,
            None => self.time_position(ctx).await,
        }
    }

    // ===== Event triggers =====

    async fn trigger_paused(&self, ctx: &Context<'_>) {
        let Some(tl_track) = self.current.clone() else {
            return;
        };
        let time_position = self.time_position(ctx).await;
        ctx.bus.send(CoreEvent::TrackPlaybackPaused {
            tl_track,
            time_position,
        });
    }

    async fn trigger_resumed(&self, ctx: &Context<'_>) {
        let Some(tl_track) = self.current.clone() else {
            return;
        };
        let time_position = self.time_position(ctx).await;
        ctx.bus.send(CoreEvent::TrackPlaybackResumed {
            tl_track,
            time_position,
        });
    }

    fn trigger_started(&self, ctx: &mut Context<'_>) {
        let Some(tl_track) = self.current.clone() else {
            return;
        };
        tracing::debug!("Track started: {}", tl_track.track.uri);

        ctx.tracklist.mark_playing(&tl_track);
        ctx.history.add(&tl_track.track);
        ctx.bus.send(CoreEvent::TrackPlaybackStarted { tl_track });
    }

    async fn trigger_ended(&mut self, ctx: &mut Context<'_>, time_position: u64) {
        let Some(tl_track) = self.current.clone() else {
            return;
        };
        if self.current_ended {
            return;
        }
        self.current_ended = true;
        tracing::debug!("Track ended: {} at {}", tl_track.track.uri, time_position);

        if !self.previous && ctx.tracklist.mark_played(Some(&tl_track)) {
            self.on_tracklist_change(ctx).await;
            ctx.bus.send(CoreEvent::TracklistChanged);
        }
        self.previous = false;

        ctx.bus.send(CoreEvent::TrackPlaybackEnded {
            tl_track,
            time_position,
        });
    }

    // ===== Persistence =====

    pub(crate) async fn save_state(&self, ctx: &Context<'_>) -> PlaybackSnapshot {
        PlaybackSnapshot {
            tlid: self.current.as_ref().map(|tl| tl.tlid),
            time_position: self.time_position(ctx).await,
            state: self.state,
        }
    }

    /// Resume a saved playback position
    pub(crate) async fn load_state(&mut self, ctx: &mut Context<'_>, snapshot: PlaybackSnapshot) {
        let Some(tlid) = snapshot.tlid else {
            return;
        };
        if snapshot.state == PlaybackState::Stopped {
            return;
        }

        self.start_paused = snapshot.state == PlaybackState::Paused;
        self.start_at_position = Some(snapshot.time_position);
        self.play(ctx, Some(tlid)).await;
    }
}
