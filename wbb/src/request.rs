//! Decoding of game-server invocations from URL query strings.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::geometry::Position;
use crate::core::rules::ArenaRules;
use crate::core::types::CallType;

/// Game ids and keys become part of file names, so they are restricted to a
/// safe set.
static FILE_SAFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("file-safe pattern compiles")
});

/// Whether `name` can be embedded in a state or log file name.
pub fn is_file_safe(name: &str) -> bool {
    FILE_SAFE.is_match(name)
}

/// Why an invocation was rejected before any turn logic ran.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    /// `serverKey` was missing or did not match the configured key.
    #[error("invalid key")]
    InvalidKey,

    #[error("no game id found")]
    MissingGameId,

    #[error("invalid game id {0:?}")]
    InvalidGameId(String),

    #[error("no call type found")]
    MissingCallType,

    #[error("failed to understand call type {0:?}")]
    UnknownCallType(String),

    #[error("{0} is required")]
    MissingParam(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidParam { name: &'static str, value: String },
}

impl RequestError {
    /// True when the caller failed authentication rather than sent bad input.
    pub fn is_auth(&self) -> bool {
        matches!(self, RequestError::InvalidKey)
    }
}

/// A decoded invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnRequest {
    /// A human asked what this bot is (`describe` / `displaySource`).
    Describe,
    Call(GameCall),
}

/// An authenticated call from the game server.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCall {
    pub game_id: String,
    pub kind: CallKind,
    /// The query string with the server key masked, for the bot log.
    pub logged_query: String,
}

impl GameCall {
    pub fn call_type(&self) -> CallType {
        match self.kind {
            CallKind::GameInit { .. } => CallType::GameInit,
            CallKind::Round(_) => CallType::Round,
            CallKind::Death => CallType::Death,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    GameInit {
        server_url: Option<String>,
        rules: ArenaRules,
    },
    Round(RoundInfo),
    Death,
}

/// Bot vitals reported by the server at the start of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInfo {
    pub position: Position,
    pub energy: i64,
    pub armor: i64,
    /// Endpoint for this round's actions, if the server sent one.
    pub url: Option<String>,
}

struct Params(Vec<(String, String)>);

impl Params {
    /// Last value wins when a name repeats.
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn required_int(&self, name: &'static str) -> Result<i64, RequestError> {
        let raw = self.get(name).ok_or(RequestError::MissingParam(name))?;
        parse_int(name, raw)
    }

    fn optional_int(&self, name: &'static str, default: i64) -> Result<i64, RequestError> {
        match self.get(name) {
            Some(raw) if !raw.trim().is_empty() => parse_int(name, raw),
            _ => Ok(default),
        }
    }

    fn non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn redacted(&self) -> String {
        let masked: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(key, value)| {
                if key == "serverKey" {
                    (key.as_str(), "***")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();
        serde_urlencoded::to_string(masked).unwrap_or_default()
    }
}

/// Integers may arrive as decimals; the fractional part is dropped.
fn parse_int(name: &'static str, raw: &str) -> Result<i64, RequestError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
        _ => Err(RequestError::InvalidParam {
            name,
            value: raw.to_string(),
        }),
    }
}

impl TurnRequest {
    /// Decode `query` (without the leading `?`), authenticating against `key`.
    pub fn parse(query: &str, key: &str) -> Result<Self, RequestError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|err| RequestError::MalformedQuery(err.to_string()))?;
        let params = Params(params);

        if params.has("describe") || params.has("displaySource") {
            return Ok(TurnRequest::Describe);
        }

        match params.get("serverKey") {
            Some(given) if given == key => {}
            _ => return Err(RequestError::InvalidKey),
        }

        let game_id = params
            .get("gameID")
            .ok_or(RequestError::MissingGameId)?
            .to_string();
        if !is_file_safe(&game_id) {
            return Err(RequestError::InvalidGameId(game_id));
        }

        let call_type = params
            .get("callType")
            .ok_or(RequestError::MissingCallType)?
            .parse::<CallType>()
            .map_err(RequestError::UnknownCallType)?;

        let kind = match call_type {
            CallType::GameInit => CallKind::GameInit {
                server_url: params.non_empty("serverURL"),
                rules: parse_rules(&params)?,
            },
            CallType::Round => CallKind::Round(RoundInfo {
                position: Position::new(params.required_int("x")?, params.required_int("y")?),
                energy: params.required_int("energy")?,
                armor: params.required_int("armor")?,
                url: params.non_empty("url"),
            }),
            CallType::Death => CallKind::Death,
        };

        debug!(game_id = %game_id, call_type = %call_type, "parsed turn request");
        Ok(TurnRequest::Call(GameCall {
            game_id,
            kind,
            logged_query: params.redacted(),
        }))
    }
}

fn parse_rules(params: &Params) -> Result<ArenaRules, RequestError> {
    let defaults = ArenaRules::default();
    Ok(ArenaRules {
        scan_range: params.optional_int("scanRange", defaults.scan_range)?,
        scan_degrees: params.optional_int("scanDegrees", defaults.scan_degrees)?,
        scan_cost: params.optional_int("scanCost", defaults.scan_cost)?,
        drive_cost: params.optional_int("driveCost", defaults.drive_cost)?,
        fire_width: params.optional_int("fireWidth", defaults.fire_width)?,
        fire_range: params.optional_int("fireRange", defaults.fire_range)?,
        fire_base_cost: params.optional_int("fireBaseCost", defaults.fire_base_cost)?,
    })
}
