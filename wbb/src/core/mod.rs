//! Deterministic, pure logic shared by the bot client.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod geometry;
pub mod log_mask;
pub mod rules;
pub mod target;
pub mod types;
