//! Loading and storing `config.yaml`.

use crate::SimulatorConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the configuration document inside a simulator root.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Errors while reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration exists at the root; the simulator was never created.
    #[error("no simulator configuration at {path}, run `simctl create` first")]
    NotProvisioned { path: PathBuf },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Path of the configuration document for a simulator root.
pub fn config_path(root_path: &Path) -> PathBuf {
    root_path.join(CONFIG_FILE_NAME)
}

/// Source of simulator configuration, keyed by root path.
pub trait ConfigProvider: Send + Sync {
    /// Load the configuration of the simulator at `root_path`.
    fn load(&self, root_path: &Path) -> Result<SimulatorConfig, ConfigError>;
}

/// Reads `root_path/config.yaml` from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlConfigProvider;

impl ConfigProvider for YamlConfigProvider {
    fn load(&self, root_path: &Path) -> Result<SimulatorConfig, ConfigError> {
        load_config(root_path)
    }
}

/// Serves one fixed configuration regardless of root path.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigProvider {
    config: SimulatorConfig,
}

impl StaticConfigProvider {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self, _root_path: &Path) -> Result<SimulatorConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Load `config.yaml` from a simulator root.
pub fn load_config(root_path: &Path) -> Result<SimulatorConfig, ConfigError> {
    let path = config_path(root_path);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::NotProvisioned { path });
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    debug!(path = %path.display(), "Loaded simulator configuration");
    parse_config(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// Parse a configuration document. An empty document yields the defaults.
pub fn parse_config(contents: &str) -> Result<SimulatorConfig, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(SimulatorConfig::default());
    }
    serde_yaml::from_str(contents)
}

/// Write `config.yaml` into a simulator root, creating the directory.
pub fn save_config(root_path: &Path, config: &SimulatorConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path(root_path);
    fs::create_dir_all(root_path).map_err(|source| ConfigError::Io {
        path: root_path.to_path_buf(),
        source,
    })?;
    let body = serde_yaml::to_string(config).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "Wrote simulator configuration");
    Ok(path)
}
