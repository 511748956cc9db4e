//! Shared test harness: a core driven by `DummyAudio` with manual event replay

#![allow(dead_code)]

use lyra_core::{AudioEvent, Mixer, Track};
use lyra_playback::{Backends, Core, CoreConfig, CoreEvent, DummyAudio, DummyBackend, EventLog};
use std::collections::VecDeque;
use std::sync::Arc;

pub const TRACK_LENGTH: u64 = 1234;

pub fn track(uri: &str) -> Track {
    Track::new(uri).with_length(TRACK_LENGTH)
}

pub fn default_tracks() -> Vec<Track> {
    vec![track("dummy:a"), track("dummy:b"), track("dummy:c")]
}

pub struct Harness {
    pub core: Core,
    pub audio: Arc<DummyAudio>,
    pub backend: Arc<DummyBackend>,
    pub log: Arc<EventLog>,
    /// Engine events not yet delivered to the core
    queue: VecDeque<AudioEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_mixer(config: CoreConfig, mixer: Arc<dyn Mixer>) -> Self {
        Self::build(config, Some(mixer))
    }

    fn build(config: CoreConfig, mixer: Option<Arc<dyn Mixer>>) -> Self {
        let audio = Arc::new(DummyAudio::new());
        let backend = Arc::new(DummyBackend::new("dummy").with_tracks(default_tracks()));
        let backends = Backends::new(vec![backend.clone()]).unwrap();
        let core = Core::new(config, audio.clone(), backends, mixer).unwrap();

        let log = Arc::new(EventLog::new());
        core.events().register(log.clone());

        Self {
            core,
            audio,
            backend,
            log,
            queue: VecDeque::new(),
        }
    }

    /// Harness with `tracks` already queued and the event log cleared
    pub async fn with_tracks(tracks: Vec<Track>) -> Self {
        let mut harness = Self::new();
        harness.core.add(tracks, None).await.unwrap();
        harness.log.clear();
        harness
    }

    fn collect(&mut self) {
        self.queue.extend(self.audio.take_events());
    }

    /// Deliver queued engine events, including those they cause
    pub async fn replay_events(&mut self) {
        self.replay_until(|_| false).await;
    }

    /// Deliver queued engine events up to (not including) the first match
    pub async fn replay_until(&mut self, stop: impl Fn(&AudioEvent) -> bool) {
        self.collect();
        while let Some(event) = self.queue.pop_front() {
            if stop(&event) {
                self.queue.push_front(event);
                return;
            }
            self.core.on_audio_event(event).await;
            self.collect();
        }
    }

    /// Run an about-to-finish round like the engine does
    ///
    /// Events queued before are delivered first; afterwards the events of
    /// the round are delivered up to `stop`.
    pub async fn trigger_about_to_finish(&mut self, stop: impl Fn(&AudioEvent) -> bool) {
        self.replay_events().await;
        self.audio.begin_about_to_finish();
        self.core.on_about_to_finish().await;
        self.audio.finish_about_to_finish();
        self.replay_until(stop).await;
    }

    pub fn events(&self) -> Vec<CoreEvent> {
        self.log.events()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.log.names()
    }

    pub fn tl(&self, index: usize) -> lyra_core::TlTrack {
        self.core.tl_tracks()[index].clone()
    }

    pub fn current_uri(&self) -> Option<String> {
        self.core.current_tl_track().map(|tl| tl.track.uri)
    }
}

pub fn never(_: &AudioEvent) -> bool {
    false
}

pub fn is_stream_changed(event: &AudioEvent) -> bool {
    matches!(event, AudioEvent::StreamChanged { .. })
}
