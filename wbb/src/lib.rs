//! Client library for Web Bot Battle arenas.
//!
//! The game server calls the bot over HTTP once per event (`gameInit`,
//! `round`, `death`). Each call is handled in isolation: state is restored
//! from disk, a turn handler acts through the game server's `fire`, `drive`
//! and `scan` methods, and state is saved for the next call.
//!
//! - **[`core`]**: Pure, deterministic logic (geometry, targets, rules).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, state files, bot log,
//!   game-server HTTP). Isolated behind traits to enable fakes in tests.
//!
//! Orchestration modules ([`request`], [`turn`], [`bot`], [`strategy`])
//! coordinate core logic with I/O for the CLI and the HTTP server.

pub mod bot;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod request;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
