//! Lyra Server Library
//!
//! HTTP control surface for the Lyra music core: configuration, the bundled
//! content backends and the REST routes.
//!
//! This library exposes the server components for testing purposes.

pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod state;

// Re-export commonly used types for convenience
pub use api::create_router;
pub use backends::{FileBackend, M3uBackend, StreamBackend};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;

use lyra_core::Backend;
use lyra_playback::{Backends, Core, CoreHandle, DummyAudio, SoftwareMixer};
use std::sync::Arc;

/// Build the core described by `config` and start it on its own task
///
/// There is no audio output yet: the core drives the silent dummy engine.
pub fn start_core(config: &ServerConfig) -> Result<CoreHandle> {
    let mut backends: Vec<Arc<dyn Backend>> = Vec::new();
    if config.file.enabled {
        backends.push(Arc::new(FileBackend::new(config.file.media_dirs.clone())));
    }
    if config.stream.enabled {
        backends.push(Arc::new(StreamBackend::new()));
    }
    if config.m3u.enabled {
        match &config.m3u.playlists_dir {
            Some(dir) => backends.push(Arc::new(M3uBackend::new(dir.clone()))),
            None => tracing::info!("No m3u playlists_dir configured, playlists disabled"),
        }
    }
    let backends = Backends::new(backends)?;
    tracing::info!("URI schemes: {}", backends.uri_schemes().join(", "));

    let core = Core::new(
        config.core.clone(),
        Arc::new(DummyAudio::new()),
        backends,
        Some(Arc::new(SoftwareMixer::default())),
    )?;

    Ok(CoreHandle::spawn(core))
}
