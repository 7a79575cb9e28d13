//! Channels and filtering for the per-game bot log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a bot log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Debug,
    Notice,
    Error,
    /// Lines written by turn handlers.
    User,
    /// Game-server traffic.
    Ws,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Debug,
        Channel::Notice,
        Channel::Error,
        Channel::User,
        Channel::Ws,
    ];

    pub fn bit(self) -> u8 {
        match self {
            Channel::Debug => LogMask::DEBUG.0,
            Channel::Notice => LogMask::NOTICE.0,
            Channel::Error => LogMask::ERROR.0,
            Channel::User => LogMask::USER.0,
            Channel::Ws => LogMask::WS.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Debug => "debug",
            Channel::Notice => "notice",
            Channel::Error => "error",
            Channel::User => "user",
            Channel::Ws => "ws",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask of enabled channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMask(u8);

impl LogMask {
    pub const NONE: LogMask = LogMask(0);
    pub const DEBUG: LogMask = LogMask(1);
    pub const NOTICE: LogMask = LogMask(2);
    pub const ERROR: LogMask = LogMask(4);
    pub const USER: LogMask = LogMask(8);
    pub const WS: LogMask = LogMask(16);
    pub const ALL: LogMask = LogMask(31);

    pub fn from_channels<'a>(channels: impl IntoIterator<Item = &'a Channel>) -> Self {
        channels
            .into_iter()
            .fold(Self::NONE, |mask, channel| LogMask(mask.0 | channel.bit()))
    }

    pub fn allows(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }
}
