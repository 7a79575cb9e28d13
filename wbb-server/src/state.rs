//! Shared application state for the bot server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use wbb::core::types::TurnReply;
use wbb::io::config::BotConfig;
use wbb::io::server::{GameServer, HttpGameServer};
use wbb::strategy::TurnHandler;
use wbb::turn::{TurnError, handle_query};

/// How turns reach the game server.
#[derive(Clone)]
pub enum Backend {
    /// Real HTTP calls. The blocking client is built on the turn's own
    /// blocking thread, never inside the async runtime.
    Http { timeout: Duration },
    /// A shared, pre-built server (used by tests).
    Shared(Arc<dyn GameServer + Send + Sync>),
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub handler: Arc<dyn TurnHandler + Send + Sync>,
    pub backend: Backend,
}

impl AppState {
    pub fn new(config: BotConfig) -> Self {
        let handler: Arc<dyn TurnHandler + Send + Sync> = Arc::from(config.strategy.handler());
        let backend = Backend::Http {
            timeout: Duration::from_secs(config.server.timeout_secs),
        };
        Self {
            config: Arc::new(config),
            handler,
            backend,
        }
    }

    /// Run one turn synchronously. Call from a blocking thread.
    pub fn run_turn(&self, query: &str) -> Result<TurnReply, TurnError> {
        match &self.backend {
            Backend::Http { timeout } => {
                let server = HttpGameServer::new(*timeout)?;
                handle_query(&self.config, query, self.handler.as_ref(), &server)
            }
            Backend::Shared(server) => {
                handle_query(&self.config, query, self.handler.as_ref(), server.as_ref())
            }
        }
    }
}
