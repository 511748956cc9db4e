//! Content backends shipped with the server
//!
//! - `file`: local files addressed by `file://` URIs
//! - `stream`: internet radio and other `http(s)` streams
//! - `m3u`: playlists stored as `.m3u` files in one directory

use async_trait::async_trait;
use lyra_core::{
    Backend, LibraryProvider, LyraError, PlaybackProvider, Playlist, PlaylistsProvider, Ref,
    RefType, Track,
};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use url::Url;

/// Extensions the file backend lists when browsing
const AUDIO_EXTENSIONS: &[&str] = &["flac", "mp3", "ogg", "opus", "wav", "m4a", "aac"];

/// URI of the virtual directory listing the media dirs
const FILE_ROOT_URI: &str = "file:root";

fn file_path(uri: &str) -> lyra_core::Result<PathBuf> {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| LyraError::InvalidInput(format!("Not a file URI: {uri}")))
}

fn file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

// ===== File backend =====

/// Plays files from the local filesystem
#[derive(Debug, Clone)]
pub struct FileBackend {
    media_dirs: Vec<PathBuf>,
}

impl FileBackend {
    pub fn new(media_dirs: Vec<PathBuf>) -> Self {
        Self { media_dirs }
    }

    async fn list_dir(&self, dir: &Path) -> lyra_core::Result<Vec<Ref>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(uri) = file_uri(&path) else {
                continue;
            };
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                dirs.push(Ref::directory(uri, display_name(&path)));
            } else if file_type.is_file() && is_audio_file(&path) {
                files.push(Ref::track(uri, display_name(&path)));
            }
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        dirs.extend(files);
        Ok(dirs)
    }
}

impl Backend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    fn library(&self) -> Option<&dyn LibraryProvider> {
        Some(self)
    }

    fn playback(&self) -> Option<&dyn PlaybackProvider> {
        Some(self)
    }
}

#[async_trait]
impl LibraryProvider for FileBackend {
    fn root_directory(&self) -> Option<Ref> {
        if self.media_dirs.is_empty() {
            return None;
        }
        Some(Ref::directory(FILE_ROOT_URI, "Files"))
    }

    async fn browse(&self, uri: &str) -> lyra_core::Result<Vec<Ref>> {
        if uri == FILE_ROOT_URI {
            return Ok(self
                .media_dirs
                .iter()
                .filter_map(|dir| Some(Ref::directory(file_uri(dir)?, display_name(dir))))
                .collect());
        }

        let path = file_path(uri)?;
        self.list_dir(&path).await
    }

    async fn lookup(&self, uri: &str) -> lyra_core::Result<Vec<Track>> {
        let path = file_path(uri)?;
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(LyraError::not_found("file", uri));
        }

        Ok(vec![Track::new(uri).with_name(display_name(&path))])
    }
}

#[async_trait]
impl PlaybackProvider for FileBackend {
    async fn translate_uri(&self, uri: &str) -> lyra_core::Result<Option<String>> {
        let path = file_path(uri)?;
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            Ok(Some(uri.to_string()))
        } else {
            tracing::warn!("File is gone: {}", path.display());
            Ok(None)
        }
    }
}

// ===== Stream backend =====

/// Plays `http`/`https` streams
#[derive(Debug, Clone, Default)]
pub struct StreamBackend;

impl StreamBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for StreamBackend {
    fn name(&self) -> &str {
        "stream"
    }

    fn uri_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string()]
    }

    fn library(&self) -> Option<&dyn LibraryProvider> {
        Some(self)
    }

    fn playback(&self) -> Option<&dyn PlaybackProvider> {
        Some(self)
    }
}

#[async_trait]
impl LibraryProvider for StreamBackend {
    async fn browse(&self, _uri: &str) -> lyra_core::Result<Vec<Ref>> {
        Ok(Vec::new())
    }

    async fn lookup(&self, uri: &str) -> lyra_core::Result<Vec<Track>> {
        let url = Url::parse(uri).map_err(|e| LyraError::InvalidInput(format!("{uri}: {e}")))?;
        if url.host_str().is_none() {
            return Err(LyraError::InvalidInput(format!("Stream URI without host: {uri}")));
        }
        Ok(vec![Track::new(uri)])
    }
}

#[async_trait]
impl PlaybackProvider for StreamBackend {
    fn is_live(&self, _uri: &str) -> bool {
        true
    }
}

// ===== M3U playlists =====

const M3U_SCHEME_PREFIX: &str = "m3u:";
const M3U_EXTENSION: &str = "m3u";
const EXTM3U: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";

/// Playlist names become file names, so path separators are replaced
fn m3u_file_name(name: &str) -> String {
    let name = name.replace(['/', '\\'], "|");
    format!("{name}.{M3U_EXTENSION}")
}

/// Parse playlist items
///
/// `#EXTINF` names the entry that follows it. Entries without a scheme are
/// paths relative to `base_dir` and become `file` URIs.
fn parse_m3u(content: &str, base_dir: &Path) -> Vec<Ref> {
    let mut items = Vec::new();
    let mut name = None;
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(info) = line.strip_prefix(EXTINF) {
            name = info.split_once(',').map(|(_, title)| title.to_string());
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let uri = if lyra_core::uri_scheme(line).is_some_and(|scheme| scheme.len() > 1) {
            line.to_string()
        } else {
            let path = base_dir.join(line);
            if name.is_none() {
                name = Some(display_name(&path));
            }
            match file_uri(&path) {
                Some(uri) => uri,
                None => {
                    tracing::warn!("Skipping playlist entry {:?}", line);
                    name = None;
                    continue;
                }
            }
        };
        items.push(Ref {
            uri,
            name: name.take(),
            kind: RefType::Track,
        });
    }
    items
}

/// Serialize tracks, writing the extended header only when some track is named
fn dump_m3u(tracks: &[Track]) -> String {
    let extended = tracks.iter().any(|track| track.name.is_some());
    let mut content = String::new();
    if extended {
        content.push_str(EXTM3U);
        content.push('\n');
    }
    for track in tracks {
        if let Some(name) = track.name.as_deref() {
            let seconds = track.length.map_or(-1, |length| (length / 1000) as i64);
            content.push_str(&format!("{EXTINF}{seconds},{name}\n"));
        }
        content.push_str(&track.uri);
        content.push('\n');
    }
    content
}

/// Stores playlists as `.m3u` files in `playlists_dir`
///
/// The directory is read on every call, so files edited by hand show up
/// without a refresh.
#[derive(Debug, Clone)]
pub struct M3uBackend {
    playlists_dir: PathBuf,
}

impl M3uBackend {
    pub fn new(playlists_dir: PathBuf) -> Self {
        Self { playlists_dir }
    }

    fn playlist_path(&self, uri: &str) -> lyra_core::Result<PathBuf> {
        uri.strip_prefix(M3U_SCHEME_PREFIX)
            .filter(|file| {
                !file.contains(['/', '\\'])
                    && Path::new(file).extension().is_some_and(|ext| ext == M3U_EXTENSION)
            })
            .map(|file| self.playlists_dir.join(file))
            .ok_or_else(|| LyraError::InvalidInput(format!("Not an m3u playlist URI: {uri}")))
    }

    async fn playlist_files(&self) -> lyra_core::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.playlists_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == M3U_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_items(&self, path: &Path) -> lyra_core::Result<Option<Vec<Ref>>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(parse_m3u(&content, &self.playlists_dir))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_playlist(&self, path: &Path) -> lyra_core::Result<Option<Playlist>> {
        let Some(items) = self.read_items(path).await? else {
            return Ok(None);
        };
        let last_modified = tokio::fs::metadata(path)
            .await?
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .and_then(|age| i64::try_from(age.as_millis()).ok());

        Ok(Some(Playlist {
            uri: m3u_uri(path),
            name: Some(display_name(path)),
            tracks: items
                .into_iter()
                .map(|item| Track {
                    name: item.name,
                    ..Track::new(item.uri)
                })
                .collect(),
            last_modified,
        }))
    }

    async fn write_playlist(&self, path: &Path, tracks: &[Track]) -> lyra_core::Result<()> {
        tokio::fs::create_dir_all(&self.playlists_dir).await?;
        tokio::fs::write(path, dump_m3u(tracks)).await?;
        Ok(())
    }
}

fn m3u_uri(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{M3U_SCHEME_PREFIX}{file}")
}

impl Backend for M3uBackend {
    fn name(&self) -> &str {
        "m3u"
    }

    fn uri_schemes(&self) -> Vec<String> {
        vec!["m3u".to_string()]
    }

    fn playlists(&self) -> Option<&dyn PlaylistsProvider> {
        Some(self)
    }
}

#[async_trait]
impl PlaylistsProvider for M3uBackend {
    async fn as_list(&self) -> lyra_core::Result<Vec<Ref>> {
        Ok(self
            .playlist_files()
            .await?
            .iter()
            .map(|path| Ref::playlist(m3u_uri(path), display_name(path)))
            .collect())
    }

    async fn get_items(&self, uri: &str) -> lyra_core::Result<Option<Vec<Ref>>> {
        let path = self.playlist_path(uri)?;
        self.read_items(&path).await
    }

    async fn lookup(&self, uri: &str) -> lyra_core::Result<Option<Playlist>> {
        let path = self.playlist_path(uri)?;
        self.read_playlist(&path).await
    }

    async fn create(&self, name: &str) -> lyra_core::Result<Option<Playlist>> {
        let path = self.playlists_dir.join(m3u_file_name(name));
        self.write_playlist(&path, &[]).await?;
        tracing::info!("Created playlist {}", path.display());
        self.read_playlist(&path).await
    }

    /// Write the playlist, renaming the file when the name changed
    async fn save(&self, playlist: Playlist) -> lyra_core::Result<Option<Playlist>> {
        let path = self.playlist_path(&playlist.uri)?;
        if tokio::fs::metadata(&path).await.is_err() {
            tracing::warn!("Not saving unknown playlist {}", playlist.uri);
            return Ok(None);
        }

        let target = match playlist.name.as_deref() {
            Some(name) if name != display_name(&path) => {
                self.playlists_dir.join(m3u_file_name(name))
            }
            _ => path.clone(),
        };
        self.write_playlist(&target, &playlist.tracks).await?;
        if target != path {
            tokio::fs::remove_file(&path).await?;
        }
        self.read_playlist(&target).await
    }

    async fn delete(&self, uri: &str) -> lyra_core::Result<bool> {
        let path = self.playlist_path(uri)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Trying to delete missing playlist file {}", path.display());
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
