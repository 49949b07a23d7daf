use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Deserialize;
use crate::core::{PostError, Result};
use crate::publish::{Viewer, DEFAULT_PREFIX};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub blob: BlobConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub viewer: ViewerConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlobConfig {
    pub endpoint: String,
    pub public_base: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiConfig {
    pub endpoint: String,
    /// unit: seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ViewerConfig {
    pub username: String,
    pub viewed_profile: Option<String>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("session.toml"),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .map_err(|err| PostError::Config(format!("Can't read {}: {}", path.display(), err)))?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Config> {
        toml::from_str(config_str).map_err(|err| PostError::Config(format!("Can't load config: {}", err)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            username: self.viewer.username.clone(),
            viewed_profile: self.viewer.viewed_profile.clone(),
        }
    }
}
