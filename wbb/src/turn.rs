//! Orchestration for a single game-server invocation.
//!
//! Each call restores the bot's state, dispatches on the call type, runs the
//! turn handler for rounds, and persists whatever the handler remembered.

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::bot::{Bot, BotInit};
use crate::core::types::TurnReply;
use crate::io::config::BotConfig;
use crate::io::game_log::{GameLog, LogBuffer};
use crate::io::server::{Endpoint, GameServer};
use crate::io::state_store::{BotState, StatePaths, load_state, remove_state, write_state};
use crate::request::{CallKind, GameCall, RequestError, RoundInfo, TurnRequest};
use crate::strategy::TurnHandler;

/// Version of this library, reported alongside the bot version at `gameInit`.
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Why a turn produced no reply.
#[derive(thiserror::Error, Debug)]
pub enum TurnError {
    /// The invocation was rejected before any state was touched.
    #[error(transparent)]
    Rejected(#[from] RequestError),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Parse `query` and run the turn it describes.
///
/// With `log.console` set, the bot log is printed to stdout once the turn
/// is over. Callers whose stdout carries the reply use
/// [`handle_query_buffered`] instead.
pub fn handle_query(
    config: &BotConfig,
    query: &str,
    handler: &dyn TurnHandler,
    server: &dyn GameServer,
) -> Result<TurnReply, TurnError> {
    let console = LogBuffer::default();
    let result = handle_query_buffered(config, query, handler, server, &console);
    if let Err(err) = console.write_to(&mut std::io::stdout().lock()) {
        warn!(error = %err, "failed to print bot log");
    }
    result
}

/// Like [`handle_query`], but console bot-log lines stay in `console` for
/// the caller to emit after the reply.
pub fn handle_query_buffered(
    config: &BotConfig,
    query: &str,
    handler: &dyn TurnHandler,
    server: &dyn GameServer,
    console: &LogBuffer,
) -> Result<TurnReply, TurnError> {
    let request = TurnRequest::parse(query, &config.key)?;
    Ok(take_turn(config, &request, handler, server, console)?)
}

/// Run one decoded invocation.
pub fn take_turn(
    config: &BotConfig,
    request: &TurnRequest,
    handler: &dyn TurnHandler,
    server: &dyn GameServer,
    console: &LogBuffer,
) -> Result<TurnReply> {
    match request {
        TurnRequest::Describe => Ok(TurnReply::text(describe(config, handler))),
        TurnRequest::Call(call) => run_call(config, call, handler, server, console),
    }
}

/// Plain-text description of the bot. Never includes the key.
pub fn describe(config: &BotConfig, handler: &dyn TurnHandler) -> String {
    format!(
        "wbb bot v{}\nstrategy: {}\n{}\n\npowered by wbb {}\n",
        config.bot_version,
        handler.name(),
        handler.description(),
        LIB_VERSION
    )
}

/// Reply to `gameInit`: `{bot_version}-{LIB_VERSION}`.
pub fn version_banner(config: &BotConfig) -> String {
    format!("{}-{}", config.bot_version, LIB_VERSION)
}

fn game_log(config: &BotConfig, paths: &StatePaths, console: &LogBuffer) -> GameLog {
    let mask = config.log.mask();
    if config.log.console {
        GameLog::console(console, mask)
    } else {
        GameLog::file(&paths.log_path, mask)
    }
}

#[instrument(skip_all, fields(game_id = %call.game_id, call_type = %call.call_type()))]
fn run_call(
    config: &BotConfig,
    call: &GameCall,
    handler: &dyn TurnHandler,
    server: &dyn GameServer,
    console: &LogBuffer,
) -> Result<TurnReply> {
    let paths = StatePaths::new(&config.state_dir(), &call.game_id, &config.key);
    let log = game_log(config, &paths, console);
    log.debug(&format!("GET: {}", call.logged_query));
    log.debug(&format!(
        "Info: gameId: {} callType: {} handler: {}",
        call.game_id,
        call.call_type(),
        handler.name()
    ));

    match &call.kind {
        CallKind::GameInit { server_url, rules } => {
            info!(server_url = ?server_url, "new game");
            log.notice(&format!(
                "New game: scan {} deg / {} range / cost {}, drive cost {}, \
                 fire {} wide / {} range / base cost {}",
                rules.scan_degrees,
                rules.scan_range,
                rules.scan_cost,
                rules.drive_cost,
                rules.fire_width,
                rules.fire_range,
                rules.fire_base_cost
            ));
            let state = BotState::new(server_url.clone(), *rules);
            save(&log, &paths, &state)?;
            Ok(TurnReply::text(version_banner(config)))
        }
        CallKind::Round(round) => {
            run_round(config, call, round, handler, server, &log, &paths)?;
            Ok(TurnReply::empty())
        }
        CallKind::Death => {
            info!("bot died");
            log.notice("Bot died, removing state file");
            remove_state(&paths.state_path)?;
            Ok(TurnReply::empty())
        }
    }
}

fn run_round(
    config: &BotConfig,
    call: &GameCall,
    round: &RoundInfo,
    handler: &dyn TurnHandler,
    server: &dyn GameServer,
    log: &GameLog,
    paths: &StatePaths,
) -> Result<()> {
    let mut state = load_state(&paths.state_path).unwrap_or_else(|| {
        warn!("no saved state, starting fresh");
        log.notice("No usable saved state, starting fresh");
        BotState::default()
    });
    let url = round
        .url
        .clone()
        .or_else(|| state.server_url.clone())
        .ok_or_else(|| anyhow!("no game server url for game {}", call.game_id))?;
    let endpoint = Endpoint {
        url,
        client_key: config.key.clone(),
        game_id: call.game_id.clone(),
    };

    let mut bot = Bot::spawn(BotInit {
        position: round.position,
        energy: round.energy,
        armor: round.armor,
        rules: state.rules,
        vars: std::mem::take(&mut state.vars),
        endpoint,
        server,
        log,
    });
    log.debug(&format!(
        "Bot: position ({}, {}) energy {} armor {}",
        round.position.x, round.position.y, round.energy, round.armor
    ));

    let outcome = handler.take_turn(&mut bot);
    let energy_left = bot.energy();
    state.vars = bot.into_vars();
    if let Err(err) = &outcome {
        log.error(&format!("ERROR: {err:#}"));
    }
    info!(energy_left, ok = outcome.is_ok(), "round finished");

    // Variables set before a failure are kept.
    save(log, paths, &state)?;
    outcome.with_context(|| format!("{} turn handler", handler.name()))
}

fn save(log: &GameLog, paths: &StatePaths, state: &BotState) -> Result<()> {
    if let Ok(rendered) = serde_json::to_string(state) {
        log.debug(&format!("setState: {rendered}"));
    }
    write_state(&paths.state_path, state).context("failed to save state")
}
