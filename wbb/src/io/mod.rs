//! I/O helpers for bot turns.

pub mod config;
pub mod game_log;
pub mod response;
pub mod server;
pub mod state_store;
