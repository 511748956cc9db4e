//! Single-task ownership of the core
//!
//! The core runs on its own tokio task and processes one message at a time:
//! client calls, engine notifications and shutdown all go through the same
//! inbox, so no two operations ever interleave. `CoreHandle` is the cheap,
//! cloneable front clients use.

use crate::controller::Core;
use crate::error::{PlaybackError, Result};
use crate::events::EventBus;
use crate::history::HistoryEntry;
use crate::types::{Criteria, TracklistOptions};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use lyra_core::{
    AudioEvent, AudioEventSink, PlaybackState, Playlist, Ref, SearchQuery, SearchResult, TlTrack,
    Tlid,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type CoreCall = Box<dyn for<'a> FnOnce(&'a mut Core) -> BoxFuture<'a, ()> + Send>;

enum Message {
    Call(CoreCall),
    Audio(AudioEvent),
    AboutToFinish(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

fn task<F>(f: F) -> CoreCall
where
    F: for<'a> FnOnce(&'a mut Core) -> BoxFuture<'a, ()> + Send + 'static,
{
    Box::new(f)
}

/// Snapshot of what is playing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    /// Playback state
    pub state: PlaybackState,
    /// Current entry
    pub current: Option<TlTrack>,
    /// Position in the current track, in milliseconds
    pub time_position: u64,
    /// Stream title of a live stream
    pub stream_title: Option<String>,
}

/// Handle to a running core
#[derive(Clone)]
pub struct CoreHandle {
    sender: mpsc::UnboundedSender<Message>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for CoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreHandle")
            .field("running", &!self.sender.is_closed())
            .finish()
    }
}

impl CoreHandle {
    /// Run the core on a new task and route its engine's notifications to it
    pub fn spawn(core: Core) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        let bus = Arc::clone(core.events());

        core.audio().set_event_sink(Arc::new(AudioBridge {
            sender: sender.clone(),
        }));
        tokio::spawn(run(core, inbox));

        Self { sender, bus }
    }

    /// Event bus of the core
    ///
    /// Listeners may be registered from any task.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Run `f` with exclusive access to the core and return its result
    pub async fn call<R, F>(&self, f: F) -> Result<R>
    where
        F: for<'a> FnOnce(&'a mut Core) -> BoxFuture<'a, R> + Send + 'static,
        R: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let call = task(move |core| {
            async move {
                let result = f(core).await;
                // Caller may have gone away
                let _ = reply.send(result);
            }
            .boxed()
        });

        self.sender
            .send(Message::Call(call))
            .map_err(|_| PlaybackError::ActorStopped)?;
        response.await.map_err(|_| PlaybackError::ActorStopped)
    }

    /// Save state (if enabled) and stop the core task
    pub async fn shutdown(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.sender
            .send(Message::Shutdown(done))
            .map_err(|_| PlaybackError::ActorStopped)?;
        finished.await.map_err(|_| PlaybackError::ActorStopped)
    }

    // ===== Playback =====

    /// Play `tlid`, or resume / start from the current entry
    pub async fn play(&self, tlid: Option<Tlid>) -> Result<()> {
        self.call(move |core| core.play(tlid).boxed()).await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<()> {
        self.call(|core| core.pause().boxed()).await
    }

    /// Resume playback
    pub async fn resume(&self) -> Result<()> {
        self.call(|core| core.resume().boxed()).await
    }

    /// Stop playback
    pub async fn stop(&self) -> Result<()> {
        self.call(|core| core.stop().boxed()).await
    }

    /// Skip to the next track
    pub async fn next(&self) -> Result<()> {
        self.call(|core| core.next().boxed()).await
    }

    /// Skip to the previous track
    pub async fn previous(&self) -> Result<()> {
        self.call(|core| core.previous().boxed()).await
    }

    /// Seek in the current track
    pub async fn seek(&self, position: i64) -> Result<bool> {
        self.call(move |core| core.seek(position).boxed()).await
    }

    /// What is playing right now
    pub async fn status(&self) -> Result<PlaybackStatus> {
        self.call(|core| {
            async move {
                PlaybackStatus {
                    state: core.state(),
                    current: core.current_tl_track(),
                    time_position: core.time_position().await,
                    stream_title: core.stream_title(),
                }
            }
            .boxed()
        })
        .await
    }

    // ===== Tracklist =====

    /// All entries together with the tracklist version
    pub async fn tl_tracks(&self) -> Result<(u64, Vec<TlTrack>)> {
        self.call(|core| {
            let snapshot = (core.tracklist().version(), core.tl_tracks());
            async move { snapshot }.boxed()
        })
        .await
    }

    /// Look up URIs and queue the resulting tracks
    pub async fn add_uris(
        &self,
        uris: Vec<String>,
        at_position: Option<usize>,
    ) -> Result<Vec<TlTrack>> {
        self.call(move |core| async move { core.add_uris(&uris, at_position).await }.boxed())
            .await?
    }

    /// Remove matching entries
    pub async fn remove(&self, criteria: Criteria) -> Result<Vec<TlTrack>> {
        self.call(move |core| async move { core.remove(&criteria).await }.boxed())
            .await
    }

    /// Remove every entry
    pub async fn clear(&self) -> Result<()> {
        self.call(|core| core.clear().boxed()).await
    }

    /// Move the entries in `[start, end)` to `to_position`
    pub async fn move_range(&self, start: usize, end: usize, to_position: usize) -> Result<()> {
        self.call(move |core| core.move_range(start, end, to_position).boxed())
            .await?
    }

    /// Shuffle the entries in `[start, end)`
    pub async fn shuffle(&self, start: Option<usize>, end: Option<usize>) -> Result<()> {
        self.call(move |core| core.shuffle(start, end).boxed()).await?
    }

    /// Tracklist mode flags
    pub async fn options(&self) -> Result<TracklistOptions> {
        self.call(|core| {
            let options = core.options();
            async move { options }.boxed()
        })
        .await
    }

    /// Replace the mode flags that are set
    pub async fn set_options(
        &self,
        repeat: Option<bool>,
        random: Option<bool>,
        single: Option<bool>,
        consume: Option<bool>,
    ) -> Result<TracklistOptions> {
        self.call(move |core| {
            if let Some(value) = repeat {
                core.set_repeat(value);
            }
            if let Some(value) = random {
                core.set_random(value);
            }
            if let Some(value) = single {
                core.set_single(value);
            }
            if let Some(value) = consume {
                core.set_consume(value);
            }
            let options = core.options();
            async move { options }.boxed()
        })
        .await
    }

    // ===== Library and playlists =====

    /// Search the library, one result per backend searched
    pub async fn search(
        &self,
        query: SearchQuery,
        uris: Option<Vec<String>>,
        exact: bool,
    ) -> Result<Vec<SearchResult>> {
        self.call(move |core| {
            async move { core.search(&query, uris.as_deref(), exact).await }.boxed()
        })
        .await
    }

    /// References to every playlist
    pub async fn playlists(&self) -> Result<Vec<Ref>> {
        self.call(|core| core.playlists_as_list().boxed()).await
    }

    /// Items of the playlist at `uri`
    pub async fn playlist_items(&self, uri: String) -> Result<Option<Vec<Ref>>> {
        self.call(move |core| async move { core.playlist_items(&uri).await }.boxed())
            .await?
    }

    pub async fn lookup_playlist(&self, uri: String) -> Result<Option<Playlist>> {
        self.call(move |core| async move { core.lookup_playlist(&uri).await }.boxed())
            .await
    }

    /// Create a playlist, preferably on the backend owning `uri_scheme`
    pub async fn create_playlist(
        &self,
        name: String,
        uri_scheme: Option<String>,
    ) -> Result<Option<Playlist>> {
        self.call(move |core| {
            async move { core.create_playlist(&name, uri_scheme.as_deref()).await }.boxed()
        })
        .await
    }

    pub async fn save_playlist(&self, playlist: Playlist) -> Result<Option<Playlist>> {
        self.call(move |core| core.save_playlist(playlist).boxed()).await
    }

    /// Delete the playlist at `uri`; `false` if nothing was deleted
    pub async fn delete_playlist(&self, uri: String) -> Result<bool> {
        self.call(move |core| async move { core.delete_playlist(&uri).await }.boxed())
            .await?
    }

    pub async fn refresh_playlists(&self, uri_scheme: Option<String>) -> Result<()> {
        self.call(move |core| {
            async move { core.refresh_playlists(uri_scheme.as_deref()).await }.boxed()
        })
        .await
    }

    // ===== History and mixer =====

    /// Played tracks, most recent first
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.call(|core| {
            let history = core.history();
            async move { history }.boxed()
        })
        .await
    }

    /// Volume and mute state
    pub async fn mixer(&self) -> Result<(Option<u8>, Option<bool>)> {
        self.call(|core| async move { (core.get_volume().await, core.get_mute().await) }.boxed())
            .await
    }

    /// Set the volume
    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        self.call(move |core| core.set_volume(volume).boxed()).await?
    }

    /// Mute or unmute
    pub async fn set_mute(&self, mute: bool) -> Result<bool> {
        self.call(move |core| core.set_mute(mute).boxed()).await
    }
}

/// Engine-side view of the core's inbox
struct AudioBridge {
    sender: mpsc::UnboundedSender<Message>,
}

#[async_trait]
impl AudioEventSink for AudioBridge {
    fn emit(&self, event: AudioEvent) {
        if self.sender.send(Message::Audio(event)).is_err() {
            tracing::debug!("Core stopped, dropping audio event");
        }
    }

    async fn about_to_finish(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(Message::AboutToFinish(done)).is_err() {
            return;
        }
        // Resolves with an error if the core stops first
        let _ = finished.await;
    }
}

async fn run(mut core: Core, mut inbox: mpsc::UnboundedReceiver<Message>) {
    tracing::debug!("Core started");
    core.setup().await;

    while let Some(message) = inbox.recv().await {
        match message {
            Message::Call(call) => call(&mut core).await,
            Message::Audio(event) => core.on_audio_event(event).await,
            Message::AboutToFinish(done) => {
                core.on_about_to_finish().await;
                let _ = done.send(());
            }
            Message::Shutdown(done) => {
                core.teardown().await;
                let _ = done.send(());
                break;
            }
        }
    }

    tracing::debug!("Core stopped");
}
