use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compost_core::{DeletionConfig, PlatformAdapter, Timings};
use compost_logging::{compost_info, compost_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unknown platform preset {0:?}")]
    UnknownPreset(String),
    #[error("no platform adapter matches host {0:?}")]
    UnknownHost(String),
    #[error("no platform given: use --platform, --host or an adapter in the config file")]
    NoPlatform,
}

/// Contents of the optional RON config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Full adapter definition; takes precedence over presets.
    pub adapter: Option<PlatformAdapter>,
    pub timings: Timings,
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                compost_warn!("Config {:?} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        compost_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Adapter for this run: the config file's, else the named preset, else
    /// the one detected from the host. Command-line endpoint overrides are
    /// applied to direct deletion.
    pub fn resolve_adapter(&self, cli: &Cli) -> Result<PlatformAdapter, ConfigError> {
        let mut adapter = if let Some(adapter) = &self.adapter {
            adapter.clone()
        } else if let Some(name) = &cli.platform {
            PlatformAdapter::preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?
        } else if let Some(host) = &cli.host {
            PlatformAdapter::for_host(host).ok_or_else(|| ConfigError::UnknownHost(host.clone()))?
        } else {
            return Err(ConfigError::NoPlatform);
        };

        if let DeletionConfig::Direct(direct) = &mut adapter.deletion {
            if let Some(base_url) = &cli.base_url {
                direct.base_url = base_url.clone();
            }
            if let Some(cookie) = &cli.cookie {
                direct.session_cookie = Some(cookie.clone());
            }
        }
        Ok(adapter)
    }
}
