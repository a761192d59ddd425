//! Configuration loading for duoqr.
//!
//! Configuration is loaded from (in order of precedence, highest first):
//! 1. Environment variables prefixed with `DUOQR_` (`__` separates sections,
//!    e.g. `DUOQR_STREAM__FPS=12`)
//! 2. A TOML file, `duoqr.toml` in the working directory unless a path is given
//! 3. Default values

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::{MAX_FPS, MIN_FPS};
use crate::protocol::Tier;
use crate::qr::{QrConfig, QrFormat};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "duoqr.toml";

/// Environment variable prefix.
const ENV_PREFIX: &str = "DUOQR_";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stream settings.
    pub stream: StreamConfig,
    /// Rendering settings.
    pub render: RenderConfig,
}

/// Stream-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Error-correction tier.
    pub tier: Tier,
    /// Animation frames per second.
    pub fps: u32,
    /// Payload transform name (`plain`, `gzip`, `gzip-aead`).
    pub transform: String,
}

/// Rendering-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Module size in pixels.
    pub module_size: u32,
    /// Quiet zone in modules, 0 disables it.
    pub quiet_zone: u32,
    /// Output format (`png`, `svg`, `ascii`).
    pub format: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tier: Tier::M,
            fps: 5,
            transform: "plain".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            module_size: 8,
            quiet_zone: 4,
            format: "png".to_string(),
        }
    }
}

impl Config {
    /// Builds the layered figment without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.stream.fps) {
            return Err(ConfigError::Validation {
                message: format!(
                    "stream.fps must be between {} and {}, got {}",
                    MIN_FPS, MAX_FPS, self.stream.fps
                ),
            });
        }
        if self.render.module_size == 0 {
            return Err(ConfigError::Validation {
                message: "render.module_size must be at least 1".to_string(),
            });
        }
        self.render
            .format
            .parse::<QrFormat>()
            .map_err(|message| ConfigError::Validation { message })?;
        Ok(())
    }

    /// Rendering settings as a [`QrConfig`].
    pub fn qr_config(&self) -> Result<QrConfig, ConfigError> {
        let format = self
            .render
            .format
            .parse::<QrFormat>()
            .map_err(|message| ConfigError::Validation { message })?;
        Ok(QrConfig {
            module_size: self.render.module_size,
            quiet_zone: self.render.quiet_zone,
            format,
        })
    }
}
