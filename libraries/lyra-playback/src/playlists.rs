//! Playlist access routed by URI scheme
//!
//! Playlists belong to the backend owning their URI scheme. Changes made
//! through the controller are announced on the event bus.

use crate::error::{PlaybackError, Result};
use crate::events::{CoreEvent, EventBus};
use crate::library::Backends;
use lyra_core::{uri_scheme, Backend, Playlist, PlaylistsProvider, Ref};
use std::sync::Arc;

/// Playlists of every backend that stores them
#[derive(Debug, Clone)]
pub struct PlaylistsController {
    backends: Arc<Backends>,
    bus: Arc<EventBus>,
}

fn check_uri(uri: &str) -> Result<()> {
    if uri_scheme(uri).is_none() {
        return Err(PlaybackError::invalid_argument(format!(
            "Expected a valid URI, got {uri:?}"
        )));
    }
    Ok(())
}

fn owns_scheme(backend: &Arc<dyn Backend>, scheme: &str) -> bool {
    backend.uri_schemes().iter().any(|owned| owned == scheme)
}

impl PlaylistsController {
    /// Create a controller announcing changes on `bus`
    pub fn new(backends: Arc<Backends>, bus: Arc<EventBus>) -> Self {
        Self { backends, bus }
    }

    fn providers(&self) -> impl Iterator<Item = (&Arc<dyn Backend>, &dyn PlaylistsProvider)> {
        self.backends
            .iter()
            .filter_map(|backend| Some((backend, backend.playlists()?)))
    }

    fn provider_for(&self, uri: &str) -> Option<(&Arc<dyn Backend>, &dyn PlaylistsProvider)> {
        let backend = self.backends.for_uri(uri)?;
        Some((backend, backend.playlists()?))
    }

    /// URI schemes of backends with playlists, sorted
    pub fn uri_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .providers()
            .flat_map(|(backend, _)| backend.uri_schemes())
            .collect();
        schemes.sort();
        schemes
    }

    /// References to every playlist
    pub async fn as_list(&self) -> Vec<Ref> {
        let mut refs = Vec::new();
        for (backend, provider) in self.providers() {
            match provider.as_list().await {
                Ok(playlists) => refs.extend(playlists),
                Err(e) => {
                    tracing::error!("{} backend failed to list playlists: {}", backend.name(), e);
                }
            }
        }
        refs
    }

    /// Items of the playlist at `uri`, `None` if there is no such playlist
    pub async fn get_items(&self, uri: &str) -> Result<Option<Vec<Ref>>> {
        check_uri(uri)?;
        let Some((backend, provider)) = self.provider_for(uri) else {
            return Ok(None);
        };
        match provider.get_items(uri).await {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::error!(
                    "{} backend failed to get items of {}: {}",
                    backend.name(),
                    uri,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Full playlist at `uri`
    pub async fn lookup(&self, uri: &str) -> Option<Playlist> {
        let (backend, provider) = self.provider_for(uri)?;
        match provider.lookup(uri).await {
            Ok(playlist) => playlist,
            Err(e) => {
                tracing::error!("{} backend failed to look up {}: {}", backend.name(), uri, e);
                None
            }
        }
    }

    /// Create a playlist named `name`
    ///
    /// The backend owning `uri_scheme` is asked first; without a match every
    /// backend is tried in order until one creates it.
    pub async fn create(&self, name: &str, uri_scheme: Option<&str>) -> Option<Playlist> {
        let owner = uri_scheme
            .and_then(|scheme| self.providers().find(|(backend, _)| owns_scheme(backend, scheme)));
        let candidates: Vec<_> = match owner {
            Some(owner) => vec![owner],
            None => self.providers().collect(),
        };

        for (backend, provider) in candidates {
            match provider.create(name).await {
                Ok(Some(playlist)) => {
                    tracing::debug!("Created playlist {}", playlist.uri);
                    self.bus.send(CoreEvent::PlaylistChanged {
                        playlist: playlist.clone(),
                    });
                    return Some(playlist);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        "{} backend failed to create playlist: {}",
                        backend.name(),
                        e
                    );
                }
            }
        }
        None
    }

    /// Save `playlist` to the backend owning its URI
    ///
    /// Returns the playlist as stored; callers must use it instead of the one
    /// they passed in.
    pub async fn save(&self, playlist: Playlist) -> Option<Playlist> {
        let (backend, provider) = self.provider_for(&playlist.uri)?;
        let uri = playlist.uri.clone();
        match provider.save(playlist).await {
            Ok(Some(saved)) => {
                self.bus.send(CoreEvent::PlaylistChanged {
                    playlist: saved.clone(),
                });
                Some(saved)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("{} backend failed to save {}: {}", backend.name(), uri, e);
                None
            }
        }
    }

    /// Delete the playlist at `uri`; returns whether it was deleted
    pub async fn delete(&self, uri: &str) -> Result<bool> {
        check_uri(uri)?;
        let Some((backend, provider)) = self.provider_for(uri) else {
            return Ok(false);
        };
        let deleted = match provider.delete(uri).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!("{} backend failed to delete {}: {}", backend.name(), uri, e);
                false
            }
        };
        if deleted {
            self.bus.send(CoreEvent::PlaylistDeleted {
                uri: uri.to_string(),
            });
        }
        Ok(deleted)
    }

    /// Reload playlists, from every backend or only the one owning `uri_scheme`
    ///
    /// `playlists_loaded` is sent when at least one backend refreshed.
    pub async fn refresh(&self, uri_scheme: Option<&str>) {
        let mut loaded = false;
        for (backend, provider) in self.providers() {
            if uri_scheme.is_some_and(|scheme| !owns_scheme(backend, scheme)) {
                continue;
            }
            match provider.refresh().await {
                Ok(()) => loaded = true,
                Err(e) => {
                    tracing::error!(
                        "{} backend failed to refresh playlists: {}",
                        backend.name(),
                        e
                    );
                }
            }
        }
        if loaded {
            self.bus.send(CoreEvent::PlaylistsLoaded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::DummyBackend;
    use crate::events::EventLog;
    use lyra_core::Track;

    fn controller(backends: Vec<Arc<dyn Backend>>) -> (PlaylistsController, Arc<EventLog>) {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(EventLog::new());
        bus.register(log.clone());
        let backends = Arc::new(Backends::new(backends).unwrap());
        (PlaylistsController::new(backends, bus), log)
    }

    fn mixtape() -> Playlist {
        let mut playlist = Playlist::new("dummy:playlist:mixtape", "mixtape");
        playlist.tracks = vec![Track::new("dummy:a").with_name("A")];
        playlist
    }

    #[tokio::test]
    async fn test_list_and_items() {
        let backend = DummyBackend::new("dummy").with_playlists(vec![mixtape()]);
        let (playlists, _) = controller(vec![Arc::new(backend)]);

        let refs = playlists.as_list().await;
        assert_eq!(refs, vec![Ref::playlist("dummy:playlist:mixtape", "mixtape")]);

        let items = playlists.get_items("dummy:playlist:mixtape").await.unwrap();
        assert_eq!(items, Some(vec![Ref::track("dummy:a", "A")]));
        assert_eq!(playlists.get_items("dummy:playlist:none").await.unwrap(), None);
        assert_eq!(playlists.get_items("other:x").await.unwrap(), None);
        assert!(playlists.get_items("not a uri").await.is_err());
    }

    #[tokio::test]
    async fn test_create_uses_requested_scheme() {
        let (playlists, log) = controller(vec![
            Arc::new(DummyBackend::new("dummy")),
            Arc::new(DummyBackend::new("other")),
        ]);

        let created = playlists.create("road trip", Some("other")).await.unwrap();
        assert_eq!(created.uri, "other:playlist:road trip");
        assert_eq!(log.names(), vec!["playlist_changed"]);

        let fallback = playlists.create("chill", Some("nowhere")).await.unwrap();
        assert_eq!(fallback.uri, "dummy:playlist:chill");
    }

    #[tokio::test]
    async fn test_save_and_delete_emit_events() {
        let backend = DummyBackend::new("dummy").with_playlists(vec![mixtape()]);
        let (playlists, log) = controller(vec![Arc::new(backend)]);

        let mut changed = mixtape();
        changed.tracks.clear();
        let saved = playlists.save(changed.clone()).await;
        assert_eq!(saved, Some(changed.clone()));
        assert_eq!(playlists.lookup("dummy:playlist:mixtape").await, Some(changed));

        assert!(playlists.delete("dummy:playlist:mixtape").await.unwrap());
        assert!(!playlists.delete("dummy:playlist:mixtape").await.unwrap());
        assert_eq!(log.names(), vec!["playlist_changed", "playlist_deleted"]);
    }

    #[tokio::test]
    async fn test_save_unknown_scheme_does_nothing() {
        let (playlists, log) = controller(vec![Arc::new(DummyBackend::new("dummy"))]);

        assert_eq!(playlists.save(Playlist::new("other:x", "x")).await, None);
        assert!(log.names().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_announces_loaded_playlists() {
        let (playlists, log) = controller(vec![Arc::new(DummyBackend::new("dummy"))]);

        playlists.refresh(Some("other")).await;
        assert!(log.names().is_empty());

        playlists.refresh(None).await;
        assert_eq!(log.names(), vec!["playlists_loaded"]);
        assert_eq!(playlists.uri_schemes(), vec!["dummy".to_string()]);
    }
}
