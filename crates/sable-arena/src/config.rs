//! Arena configuration loading.
//!
//! The arena reads an optional `arena.toml` from the working directory:
//!
//! ```toml
//! [bots.sable]
//! path = "target/release/sable"
//! time_control = "movetime 200"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or using the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("bot not found: {0}")]
    BotNotFound(String),
}

/// One configured engine binary.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotConfig {
    /// Path to the engine executable.
    pub path: PathBuf,
    /// `go` arguments used for every move (e.g. "movetime 500").
    #[serde(default = "default_time_control")]
    pub time_control: String,
}

fn default_time_control() -> String {
    "movetime 500".to_string()
}

/// The arena configuration: named engine binaries.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ArenaConfig {
    #[serde(default)]
    pub bots: HashMap<String, BotConfig>,
}

impl ArenaConfig {
    /// The default configuration file name.
    pub const FILE_NAME: &'static str = "arena.toml";

    /// Loads the configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Loads `arena.toml` from the working directory, or an empty
    /// configuration when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(Self::FILE_NAME);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Looks up a configured bot by name.
    pub fn get_bot(&self, name: &str) -> Result<&BotConfig, ConfigError> {
        self.bots
            .get(name)
            .ok_or_else(|| ConfigError::BotNotFound(name.to_string()))
    }

    /// Resolves a name to a bot: configured bots win, anything else is
    /// treated as a path to an executable.
    pub fn resolve(&self, name: &str) -> BotConfig {
        match self.bots.get(name) {
            Some(bot) => bot.clone(),
            None => BotConfig {
                path: PathBuf::from(name),
                time_control: default_time_control(),
            },
        }
    }
}
