/// Shared application state
use lyra_playback::CoreHandle;

/// Application state shared across all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub core: CoreHandle,
}

impl AppState {
    pub fn new(core: CoreHandle) -> Self {
        Self { core }
    }
}
