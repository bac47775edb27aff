//! CLI configuration

use anyhow::Result;
use config::{Config, Environment, File};
use leasedesk_http::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from defaults, the config file and `LEASEDESK_*` variables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API endpoints and timing
    pub api: ClientConfig,

    /// Where the session is kept between runs
    pub session_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; otherwise `<config dir>/leasedesk/config.toml`
    /// is read when present. Environment variables override both, e.g.
    /// `LEASEDESK_API__BASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => builder = builder.add_source(File::from(path)),
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("LEASEDESK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Session file, falling back to `<data dir>/session.json`
    pub fn session_path(&self, data_dir: Option<&Path>) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| data_dir_or_default(data_dir).join("session.json"))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("leasedesk").join("config.toml"))
}

/// Explicit data directory, `LEASEDESK_STATE_DIR`, or the platform data dir
pub fn data_dir_or_default(data_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = data_dir {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("LEASEDESK_STATE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leasedesk")
}
