//! Backend registry and library routing
//!
//! Every URI is routed to the backend that owns its scheme. Backend failures
//! are logged and turned into empty results.

use crate::error::{PlaybackError, Result};
use lyra_core::{
    uri_scheme, Backend, LibraryProvider, PlaybackProvider, PlaylistsProvider, Ref, SearchQuery,
    SearchResult, Track,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registered backends, indexed by URI scheme
#[derive(Clone, Default)]
pub struct Backends {
    backends: Vec<Arc<dyn Backend>>,
    by_scheme: HashMap<String, Arc<dyn Backend>>,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<&String> = self.by_scheme.keys().collect();
        schemes.sort();
        f.debug_struct("Backends").field("schemes", &schemes).finish()
    }
}

impl Backends {
    /// Register backends
    ///
    /// Fails if two backends claim the same URI scheme.
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Result<Self> {
        let mut by_scheme: HashMap<String, Arc<dyn Backend>> = HashMap::new();

        for backend in &backends {
            for scheme in backend.uri_schemes() {
                if let Some(existing) = by_scheme.get(&scheme) {
                    return Err(PlaybackError::Config(format!(
                        "Cannot add URI scheme \"{scheme}\" for {}, it is already handled by {}",
                        backend.name(),
                        existing.name()
                    )));
                }
                by_scheme.insert(scheme, Arc::clone(backend));
            }
        }

        tracing::debug!(
            "Registered {} backends for {} URI schemes",
            backends.len(),
            by_scheme.len()
        );

        Ok(Self {
            backends,
            by_scheme,
        })
    }

    /// Backend owning the scheme of `uri`
    pub fn for_uri(&self, uri: &str) -> Option<&Arc<dyn Backend>> {
        self.by_scheme.get(&uri_scheme(uri)?)
    }

    /// Playback provider for `uri`, if its backend can play
    pub fn playback_for(&self, uri: &str) -> Option<&dyn PlaybackProvider> {
        self.for_uri(uri)?.playback()
    }

    /// Library provider for `uri`, if its backend has a library
    pub fn library_for(&self, uri: &str) -> Option<&dyn LibraryProvider> {
        self.for_uri(uri)?.library()
    }

    /// Playlists provider for `uri`, if its backend stores playlists
    pub fn playlists_for(&self, uri: &str) -> Option<&dyn PlaylistsProvider> {
        self.for_uri(uri)?.playlists()
    }

    /// All backends in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.iter()
    }

    /// Registered URI schemes, sorted
    pub fn uri_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.by_scheme.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

/// Library access routed by URI scheme
#[derive(Debug, Clone)]
pub struct LibraryController {
    backends: Arc<Backends>,
}

impl LibraryController {
    /// Create a controller over the registered backends
    pub fn new(backends: Arc<Backends>) -> Self {
        Self { backends }
    }

    /// Resolve each URI to its tracks
    ///
    /// Every requested URI is present in the result; URIs without a backend
    /// or whose lookup failed map to an empty list.
    pub async fn lookup(&self, uris: &[String]) -> HashMap<String, Vec<Track>> {
        let mut results = HashMap::with_capacity(uris.len());

        for uri in uris {
            if results.contains_key(uri) {
                continue;
            }
            let tracks = match self.backends.for_uri(uri) {
                Some(backend) => match backend.library() {
                    Some(library) => match library.lookup(uri).await {
                        Ok(tracks) => tracks,
                        Err(e) => {
                            tracing::error!(
                                "{} backend failed to look up {}: {}",
                                backend.name(),
                                uri,
                                e
                            );
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                },
                None => {
                    tracing::debug!("No backend for {}", uri);
                    Vec::new()
                }
            };
            results.insert(uri.clone(), tracks);
        }

        results
    }

    /// Browse a directory; `None` lists the backends' root directories
    pub async fn browse(&self, uri: Option<&str>) -> Vec<Ref> {
        let Some(uri) = uri else {
            return self.roots();
        };
        if uri.trim().is_empty() {
            return Vec::new();
        }

        let Some(backend) = self.backends.for_uri(uri) else {
            return Vec::new();
        };
        let Some(library) = backend.library() else {
            return Vec::new();
        };

        match library.browse(uri).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!("{} backend failed to browse {}: {}", backend.name(), uri, e);
                Vec::new()
            }
        }
    }

    /// Search every library, or only the backends owning `uris`
    ///
    /// Each backend gets the subset of `uris` it owns; URIs without a
    /// backend are dropped. An empty query finds nothing.
    pub async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> Vec<SearchResult> {
        if query.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for (backend, backend_uris) in self.backends_to_uris(uris) {
            let Some(library) = backend.library() else {
                continue;
            };
            match library.search(query, backend_uris.as_deref(), exact).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("{} backend failed to search: {}", backend.name(), e);
                }
            }
        }
        results
    }

    fn backends_to_uris(
        &self,
        uris: Option<&[String]>,
    ) -> Vec<(&Arc<dyn Backend>, Option<Vec<String>>)> {
        let Some(uris) = uris.filter(|uris| !uris.is_empty()) else {
            return self
                .backends
                .iter()
                .filter(|backend| backend.library().is_some())
                .map(|backend| (backend, None))
                .collect();
        };

        let mut grouped: Vec<(&Arc<dyn Backend>, Option<Vec<String>>)> = Vec::new();
        for uri in uris {
            let Some(backend) = self.backends.for_uri(uri) else {
                tracing::debug!("No backend to search {}", uri);
                continue;
            };
            match grouped
                .iter_mut()
                .find(|(known, _)| Arc::ptr_eq(*known, backend))
            {
                Some((_, Some(backend_uris))) => backend_uris.push(uri.clone()),
                _ => grouped.push((backend, Some(vec![uri.clone()]))),
            }
        }
        grouped
    }

    fn roots(&self) -> Vec<Ref> {
        let mut roots: Vec<Ref> = self
            .backends
            .iter()
            .filter_map(|backend| backend.library()?.root_directory())
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));
        roots.dedup();
        roots
    }
}
