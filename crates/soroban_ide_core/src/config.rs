//! Configuration for the IDE client.
//!
//! [`IdeConfig`] is persisted as TOML, typically at
//! `~/.config/soroban-ide/config.toml` on Unix systems. Every field has a
//! default, so a missing file or a partial file both load cleanly.
//!
//! # Example
//!
//! ```ignore
//! use soroban_ide_core::config::IdeConfig;
//!
//! let config = IdeConfig::load()?;
//! let backend = HttpBackend::new(&config.api_base_url);
//! let channel = LiveChannelClient::spawn(
//!     config.channel_url(),
//!     Arc::new(TungsteniteConnector),
//!     config.channel_options(),
//! );
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_API_BASE_URL;
use crate::channel::{DEFAULT_HISTORY_CAPACITY, ReconnectPolicy};
use crate::error::{IdeError, Result};
use crate::network::Network;
use crate::template::DEFAULT_TEMPLATE;

/// Default address of the build server's event stream.
pub const DEFAULT_CHANNEL_URL: &str = "ws://localhost:8000/ws";

/// Derive the event stream URL from an HTTP API base URL.
pub fn channel_url_for(api_base_url: &str) -> String {
    let ws = api_base_url
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    format!("{}/ws", ws.trim_end_matches('/'))
}

/// Reconnect strategy as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectStrategy {
    /// Same delay after every close.
    #[default]
    Fixed,
    /// Doubling delay with jitter, capped at `max_delay_ms`.
    Exponential,
}

/// Reconnect settings for the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Fixed delay, or the base delay for the exponential strategy.
    pub delay_ms: u64,
    /// Which delay schedule to use.
    pub strategy: ReconnectStrategy,
    /// Cap for the exponential strategy.
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            strategy: ReconnectStrategy::Fixed,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectConfig {
    /// Runtime policy for these settings.
    pub fn policy(&self) -> ReconnectPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.strategy {
            ReconnectStrategy::Fixed => ReconnectPolicy::Fixed(delay),
            ReconnectStrategy::Exponential => ReconnectPolicy::ExponentialJitter {
                base: delay,
                max: Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
            },
        }
    }
}

/// User-configurable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeConfig {
    /// Build server base URL (e.g. "http://localhost:8000")
    pub api_base_url: String,

    /// Event stream URL; derived from `api_base_url` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_url: Option<String>,

    /// Network used for deploy and invoke when none is given
    pub network: Network,

    /// Live channel reconnect settings.
    pub reconnect: ReconnectConfig,

    /// Number of channel messages kept in memory
    pub history_capacity: usize,

    /// Session store file; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Template used when creating a new project
    pub default_template: String,
}

impl Default for IdeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            channel_url: None,
            network: Network::default(),
            reconnect: ReconnectConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            store_path: None,
            default_template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl IdeConfig {
    /// Event stream URL to connect to.
    pub fn channel_url(&self) -> String {
        self.channel_url
            .clone()
            .unwrap_or_else(|| channel_url_for(&self.api_base_url))
    }

    /// Driver options for [`crate::channel::LiveChannelClient`].
    #[cfg(feature = "native-channel")]
    pub fn channel_options(&self) -> crate::channel::ChannelOptions {
        crate::channel::ChannelOptions {
            policy: self.reconnect.policy(),
            history_capacity: self.history_capacity,
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: IdeConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config from `path`, returning defaults if the file does not exist.
    pub fn load_from_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| IdeError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// Native-only locations (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl IdeConfig {
    /// Get the config file path (~/.config/soroban-ide/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("soroban-ide").join("config.toml"))
    }

    /// Load config from the default location, or defaults if there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default(&path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(IdeError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Session store file: `store_path`, or `<data dir>/soroban-ide/session.json`.
    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("soroban-ide").join("session.json"))
            .ok_or(IdeError::NoConfigDir)
    }
}
