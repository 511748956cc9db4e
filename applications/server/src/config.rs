/// Server configuration
use crate::error::{Result, ServerError};
use lyra_playback::CoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides (`LYRA_SERVER__PORT=7000`)
pub const ENV_PREFIX: &str = "LYRA";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub file: FileSettings,

    #[serde(default)]
    pub stream: StreamSettings,

    #[serde(default)]
    pub m3u: M3uSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Local files backend
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directories shown when browsing; lookups are not limited to them
    #[serde(default)]
    pub media_dirs: Vec<PathBuf>,
}

/// Internet streams backend
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// M3U playlists backend
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct M3uSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory holding the `.m3u` files; playlists are off without one
    #[serde(default)]
    pub playlists_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `config.toml` in the working
    /// directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (LYRA_CORE__RESTORE_STATE=true)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ServerError::Config(format!(
                "server.host must be an IP address, got {:?}",
                self.server.host
            )));
        }

        if self.server.port == 0 {
            return Err(ServerError::Config(
                "server.port must not be 0".to_string(),
            ));
        }

        if !self.file.enabled && !self.stream.enabled {
            tracing::warn!("No backend enabled, nothing will be playable");
        }

        self.core
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6680
}

fn default_enabled() -> bool {
    true
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            media_dirs: Vec::new(),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl Default for M3uSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            playlists_dir: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            core: CoreConfig::default(),
            file: FileSettings::default(),
            stream: StreamSettings::default(),
            m3u: M3uSettings::default(),
        }
    }
}
