//! Per-game bot log (`wbb-{game}-{key}.mlog.txt`).
//!
//! # Separation of Concerns
//!
//! - **Bot log (this module)**: product output for whoever runs the bot.
//!   Filtered by the configured channels, unaffected by `RUST_LOG`.
//!
//! - **Tracing (`logging`)**: dev diagnostics via `RUST_LOG`, output to stderr.
//!
//! Console output is buffered in a [`LogBuffer`] and emitted by the caller
//! once the reply is out, so it can never land ahead of CGI headers.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use tracing::warn;

use crate::core::log_mask::{Channel, LogMask};

/// Bot-log lines held back until the turn's reply has been written.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<String>>);

impl LogBuffer {
    /// Drain everything buffered so far.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lock())
    }

    /// Drain the buffer into `out`. Writes nothing when empty.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        let lines = self.take();
        if lines.is_empty() {
            return Ok(());
        }
        out.write_all(lines.as_bytes())?;
        out.flush()
    }

    fn push(&self, line: &str) {
        self.lock().push_str(line);
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
enum Sink {
    File(PathBuf),
    Console(LogBuffer),
    Discard,
}

/// Append-only, channel-filtered log for one bot in one game.
///
/// Writes are best effort: a failing log must never fail a turn.
#[derive(Debug, Clone)]
pub struct GameLog {
    sink: Sink,
    mask: LogMask,
}

impl GameLog {
    pub fn file(path: &Path, mask: LogMask) -> Self {
        Self {
            sink: Sink::File(path.to_path_buf()),
            mask,
        }
    }

    /// Log into `buffer`, for the caller to print after the reply.
    pub fn console(buffer: &LogBuffer, mask: LogMask) -> Self {
        Self {
            sink: Sink::Console(buffer.clone()),
            mask,
        }
    }

    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self {
            sink: Sink::Discard,
            mask: LogMask::NONE,
        }
    }

    pub fn enabled(&self, channel: Channel) -> bool {
        self.mask.allows(channel)
    }

    pub fn write(&self, channel: Channel, message: &str) {
        if !self.enabled(channel) {
            return;
        }
        let line = format_line(channel, message);
        let result = match &self.sink {
            Sink::File(path) => append(path, &line),
            Sink::Console(buffer) => {
                buffer.push(&line);
                Ok(())
            }
            Sink::Discard => Ok(()),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to write bot log");
        }
    }

    pub fn debug(&self, message: &str) {
        self.write(Channel::Debug, message);
    }

    pub fn notice(&self, message: &str) {
        self.write(Channel::Notice, message);
    }

    pub fn error(&self, message: &str) {
        self.write(Channel::Error, message);
    }

    pub fn ws(&self, message: &str) {
        self.write(Channel::Ws, message);
    }
}

fn format_line(channel: Channel, message: &str) -> String {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("{stamp} [{channel}] {message}\n")
}

fn append(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}
