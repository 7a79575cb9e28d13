//! Bot configuration stored in `wbb.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::log_mask::{Channel, LogMask};
use crate::request::is_file_safe;
use crate::strategy::StrategyKind;

pub const DEFAULT_CONFIG_PATH: &str = "wbb.toml";

/// Bot configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// values that work against a local arena; only `key` must be filled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BotConfig {
    /// Key shared with the game server. Authenticates incoming calls and is
    /// sent back as `clientKey` on every action.
    pub key: String,

    /// Version reported to the game server at `gameInit`.
    pub bot_version: String,

    /// Directory for state files and bot logs. Defaults to the system temp dir.
    pub state_dir: Option<PathBuf>,

    /// Built-in turn handler to run each round.
    pub strategy: StrategyKind,

    pub log: LogConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Channels written to the bot log.
    pub channels: Vec<Channel>,
    /// Print the bot log after each reply instead of appending to the
    /// per-game file. `wbb` prints to stderr, `wbb-server` to stdout.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            channels: Channel::ALL.to_vec(),
            console: false,
        }
    }
}

impl LogConfig {
    pub fn mask(&self) -> LogMask {
        LogMask::from_channels(&self.channels)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Timeout for each call to the game server.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            bot_version: "0.1".to_string(),
            state_dir: None,
            strategy: StrategyKind::default(),
            log: LogConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(anyhow!("key must be set"));
        }
        // The key is part of every state and log file name.
        if !is_file_safe(&self.key) {
            return Err(anyhow!(
                "key may only contain letters, digits, '_' and '-' (at most 64)"
            ));
        }
        if self.bot_version.trim().is_empty() {
            return Err(anyhow!("bot_version must not be empty"));
        }
        if self.server.timeout_secs == 0 {
            return Err(anyhow!("server.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Directory that holds state files and bot logs.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Load config from a TOML file.
///
/// A missing file yields the defaults, which fail validation until a key is
/// configured.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        let cfg = BotConfig::default();
        cfg.validate()
            .with_context(|| format!("no config at {}", path.display()))?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BotConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
