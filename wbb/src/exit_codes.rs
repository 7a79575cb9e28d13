//! Stable exit codes for `wbb` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, I/O, or game-server errors.
pub const INVALID: i32 = 1;
/// The invocation was rejected (bad key, missing or malformed parameters).
pub const REJECTED: i32 = 2;
