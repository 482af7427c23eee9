use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::game::{DEFAULT_POINT_COUNT, MAX_POINT_COUNT, MIN_POINT_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Settings remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub point_count: usize,
    pub auto_play: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            point_count: DEFAULT_POINT_COUNT,
            auto_play: false,
        }
    }
}

impl Config {
    /// A hand-edited file may hold any count
    pub fn sanitized(mut self) -> Self {
        self.point_count = self.point_count.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT);
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = crate::app_dirs::AppDirs::config_path()
            .unwrap_or_else(|| PathBuf::from("pointrush_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no stored config, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
