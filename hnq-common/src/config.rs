//! Bootstrap configuration loading
//!
//! All settings live in one TOML file. Every field has a built-in default, so
//! a missing file (or a missing section) is not an error: the service logs a
//! warning and starts with defaults.
//!
//! # Config File Resolution
//!
//! 1. Command-line argument (highest priority)
//! 2. `HNQ_CONFIG` environment variable
//! 3. `<config_dir>/hnq/config.toml` (e.g. `~/.config/hnq/config.toml`)
//! 4. Compiled defaults (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HNQ_CONFIG";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_GAME_ITEM_LIMIT: usize = 20;
pub const DEFAULT_BROWSE_ITEM_LIMIT: usize = 100;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream content API
    #[serde(default)]
    pub hacker_news: HackerNewsConfig,

    /// Guessing game settings
    #[serde(default)]
    pub game: GameConfig,

    /// Browse/search view settings
    #[serde(default)]
    pub browse: BrowseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            hacker_news: HackerNewsConfig::default(),
            game: GameConfig::default(),
            browse: BrowseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which upstream story list to draw identifiers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    #[default]
    Top,
    New,
    Best,
}

impl Feed {
    /// Path of the identifier-list endpoint, relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Feed::Top => "topstories.json",
            Feed::New => "newstories.json",
            Feed::Best => "beststories.json",
        }
    }
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HackerNewsConfig {
    /// Base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Story list to draw from
    #[serde(default)]
    pub feed: Feed,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cap on concurrent item fetches; unset means every fetch starts at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<NonZeroUsize>,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            feed: Feed::default(),
            timeout_secs: default_timeout_secs(),
            max_in_flight: None,
        }
    }
}

/// Guessing game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Leading identifiers materialized per session
    #[serde(default = "default_game_item_limit")]
    pub item_limit: NonZeroUsize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            item_limit: default_game_item_limit(),
        }
    }
}

/// Browse view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Leading identifiers materialized per browse request
    #[serde(default = "default_browse_item_limit")]
    pub item_limit: NonZeroUsize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            item_limit: default_browse_item_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Build an `EnvFilter` directive for the given crate and its HTTP layer
    pub fn filter_directive(&self, crate_name: &str) -> String {
        format!("{crate_name}={level},tower_http={level}", level = self.level)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_game_item_limit() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_GAME_ITEM_LIMIT).unwrap_or(NonZeroUsize::MIN)
}

fn default_browse_item_limit() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_BROWSE_ITEM_LIMIT).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        let base = self.hacker_news.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "hacker_news.base_url must be an http(s) URL, got {:?}",
                self.hacker_news.base_url
            )));
        }
        if self.hacker_news.timeout_secs == 0 {
            return Err(Error::Config(
                "hacker_news.timeout_secs must be greater than zero".to_string(),
            ));
        }
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(Error::Config(format!("Unknown log level: {other}"))),
        }
    }
}

/// Default config file location for the current user
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hnq").join("config.toml"))
}

/// Pick the config file to load, following the resolution order above
///
/// Returns `None` when no candidate exists; callers fall back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    default_config_path().filter(|p| p.exists())
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the resolved config, degrading to defaults when the file is absent
///
/// A file that exists but fails to parse or validate is an error.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Serialize a config to disk, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
