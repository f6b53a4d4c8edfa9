use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_EVENT_SCHEME, DEFAULT_MESSAGE_HANDLER, DEFAULT_READY_TIMEOUT_MS,
};
use crate::player::DisplayFlags;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Flags new player configurations start from
    #[serde(default)]
    pub display: DisplayFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Origin the page document is loaded under
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "default_event_scheme")]
    pub event_scheme: String,

    #[serde(default = "default_message_handler")]
    pub message_handler: String,

    #[serde(default)]
    pub command_policy: CommandPolicy,

    /// How long held commands wait for the page to signal readiness before
    /// they resolve to nothing
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

/// How the page reports events back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// JSON envelopes posted on a named native message handler
    #[default]
    MessageChannel,
    /// Navigations to `<event_scheme>://<event>?data=<value>`
    UrlScheme,
}

/// What happens to commands issued before the page signals readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPolicy {
    #[default]
    QueueUntilReady,
    Immediate,
}

impl BridgeConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("ytplayer").join("config.toml"))
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            template_path: None,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            event_scheme: default_event_scheme(),
            message_handler: default_message_handler(),
            command_policy: CommandPolicy::default(),
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_event_scheme() -> String {
    DEFAULT_EVENT_SCHEME.to_string()
}
fn default_message_handler() -> String {
    DEFAULT_MESSAGE_HANDLER.to_string()
}
fn default_ready_timeout_ms() -> u64 {
    DEFAULT_READY_TIMEOUT_MS
}
