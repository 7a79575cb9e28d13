//! Test-only helpers: a scripted game server and a throwaway arena.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::io::config::BotConfig;
use crate::io::server::{Endpoint, GameServer, ServerMethod};

/// A call received by [`ScriptedServer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub method: ServerMethod,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Game server that answers with queued bodies and records every call.
#[derive(Debug, Default)]
pub struct ScriptedServer {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedServer {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// XML body of a `fire` response.
    pub fn fire_reply(bots_hit: u32) -> String {
        format!("<response><responseValues><botsHit>{bots_hit}</botsHit></responseValues></response>")
    }

    /// XML body of a `scan` response; each hit is `(angle, distance, condition)`.
    pub fn scan_reply(hits: &[(f64, f64, i64)]) -> String {
        let bots: String = hits
            .iter()
            .map(|(angle, distance, condition)| {
                format!(
                    "<bot><angle>{angle}</angle><distance>{distance}</distance><condition>{condition}</condition></bot>"
                )
            })
            .collect();
        format!(
            "<response><responseValues><hits>{}</hits><coords>{bots}</coords></responseValues></response>",
            hits.len()
        )
    }
}

impl GameServer for ScriptedServer {
    fn call(
        &self,
        endpoint: &Endpoint,
        method: ServerMethod,
        params: &[(&'static str, String)],
    ) -> Result<String> {
        let call = RecordedCall {
            endpoint: endpoint.clone(),
            method,
            params: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        };
        self.calls
            .lock()
            .map_err(|_| anyhow!("scripted server poisoned"))?
            .push(call);
        self.replies
            .lock()
            .map_err(|_| anyhow!("scripted server poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply left for {method}"))
    }
}

pub const TEST_KEY: &str = "s3cret";

/// Config rooted in `state_dir`, with the test key and every log channel on.
pub fn test_config(state_dir: &Path) -> BotConfig {
    BotConfig {
        key: TEST_KEY.to_string(),
        state_dir: Some(state_dir.to_path_buf()),
        ..BotConfig::default()
    }
}

/// Temporary state directory plus a matching config.
pub struct TestArena {
    dir: tempfile::TempDir,
    pub config: BotConfig,
}

impl TestArena {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path());
        Ok(Self { dir, config })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Query string for a call from the game server, authenticated with the test key.
    pub fn query(&self, game_id: &str, call_type: &str, extra: &str) -> String {
        let mut query = format!("serverKey={TEST_KEY}&gameID={game_id}&callType={call_type}");
        if !extra.is_empty() {
            query.push('&');
            query.push_str(extra);
        }
        query
    }
}
