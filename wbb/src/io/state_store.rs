//! Per-game bot state persisted between turns.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::rules::ArenaRules;

/// Everything a bot remembers from one turn to the next
/// (`wbb-{game}-{key}.state.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BotState {
    /// Action endpoint announced at `gameInit`.
    pub server_url: Option<String>,
    /// Arena rules announced at `gameInit`.
    pub rules: ArenaRules,
    /// Variables set by turn handlers.
    pub vars: BTreeMap<String, Value>,
}

impl BotState {
    pub fn new(server_url: Option<String>, rules: ArenaRules) -> Self {
        Self {
            server_url,
            rules,
            vars: BTreeMap::new(),
        }
    }
}

/// File locations for one bot in one game.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub state_path: PathBuf,
    pub log_path: PathBuf,
}

impl StatePaths {
    pub fn new(dir: &Path, game_id: &str, key: &str) -> Self {
        let stem = format!("wbb-{game_id}-{key}");
        Self {
            state_path: dir.join(format!("{stem}.state.json")),
            log_path: dir.join(format!("{stem}.mlog.txt")),
        }
    }
}

/// Load bot state from disk.
///
/// Missing, empty or unreadable files yield `None`: the bot starts fresh
/// rather than failing the turn.
pub fn load_state(path: &Path) -> Option<BotState> {
    debug!(path = %path.display(), "loading bot state");
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no bot state");
            return None;
        }
    };
    if contents.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<BotState>(&contents) {
        Ok(state) => {
            debug!(vars = state.vars.len(), "bot state loaded");
            Some(state)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding unparsable bot state");
            None
        }
    }
}

/// Atomically write bot state to disk (temp file + rename).
pub fn write_state(path: &Path, state: &BotState) -> Result<()> {
    debug!(path = %path.display(), vars = state.vars.len(), "writing bot state");
    let mut buf = serde_json::to_string_pretty(state).context("serialize bot state")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Delete bot state. Missing files are not an error.
pub fn remove_state(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed bot state");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove bot state {}", path.display())),
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp bot state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace bot state {}", path.display()))?;
    Ok(())
}
