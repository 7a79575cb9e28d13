//! Shared types describing a single game-server invocation.
//!
//! These types define stable contracts between the request parser, turn
//! orchestration and the HTTP/CLI front ends.

use std::fmt;
use std::str::FromStr;

/// Kind of call the game server makes to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// New game: reset state and report the bot version.
    GameInit,
    /// The bot's turn to act.
    Round,
    /// The bot was destroyed; forget its state.
    Death,
}

impl CallType {
    pub fn as_str(self) -> &'static str {
        match self {
            CallType::GameInit => "gameInit",
            CallType::Round => "round",
            CallType::Death => "death",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gameInit" => Ok(CallType::GameInit),
            "round" => Ok(CallType::Round),
            "death" => Ok(CallType::Death),
            other => Err(other.to_string()),
        }
    }
}

/// Body returned to the game server (or a human, for `describe`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub body: String,
}

impl TurnReply {
    pub fn empty() -> Self {
        Self {
            body: String::new(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_type_parses_wire_names() {
        assert_eq!("gameInit".parse::<CallType>(), Ok(CallType::GameInit));
        assert_eq!("round".parse::<CallType>(), Ok(CallType::Round));
        assert_eq!("death".parse::<CallType>(), Ok(CallType::Death));
        assert_eq!("Round".parse::<CallType>(), Err("Round".to_string()));
    }
}
