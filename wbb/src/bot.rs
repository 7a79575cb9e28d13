//! The bot as seen by a turn handler.
//!
//! A [`Bot`] lives for a single round. It tracks the vitals the game server
//! reported, mirrors every action's energy cost locally, and carries the
//! handler's variables so they can be persisted for the next turn.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::geometry::{Position, driving_directions, normalize_degrees};
use crate::core::log_mask::Channel;
use crate::core::rules::ArenaRules;
use crate::core::target::Target;
use crate::io::game_log::GameLog;
use crate::io::response::{parse_fire, parse_scan};
use crate::io::server::{Endpoint, GameServer, ServerMethod, call_params};

pub struct Bot<'a> {
    position: Position,
    energy: i64,
    armor: i64,
    rules: ArenaRules,
    vars: BTreeMap<String, Value>,
    endpoint: Endpoint,
    server: &'a dyn GameServer,
    log: &'a GameLog,
}

/// Inputs for [`Bot::spawn`].
pub struct BotInit<'a> {
    pub position: Position,
    pub energy: i64,
    pub armor: i64,
    pub rules: ArenaRules,
    pub vars: BTreeMap<String, Value>,
    pub endpoint: Endpoint,
    pub server: &'a dyn GameServer,
    pub log: &'a GameLog,
}

impl<'a> Bot<'a> {
    pub fn spawn(init: BotInit<'a>) -> Self {
        Self {
            position: init.position,
            energy: init.energy,
            armor: init.armor,
            rules: init.rules,
            vars: init.vars,
            endpoint: init.endpoint,
            server: init.server,
            log: init.log,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Energy left this round, after locally accounted action costs.
    pub fn energy(&self) -> i64 {
        self.energy
    }

    pub fn armor(&self) -> i64 {
        self.armor
    }

    pub fn rules(&self) -> &ArenaRules {
        &self.rules
    }

    /// Fire a shot toward `angle` with up to `energy` force.
    ///
    /// The shot is clamped to what the bot can afford. Returns the number of
    /// bots hit.
    pub fn fire(&mut self, angle: f64, energy: i64) -> Result<u32> {
        let shot = energy.clamp(0, self.rules.affordable_shot(self.energy));
        let body = self.call(
            ServerMethod::Fire,
            &[("energy", shot.to_string()), ("degree", format_angle(angle)?)],
        )?;
        self.spend(shot + self.rules.fire_base_cost);

        let hits = parse_fire(&body)?;
        debug!(angle, shot, hits, "fired");
        Ok(hits)
    }

    /// Drive toward `to`, one axis at a time, until arriving or running dry.
    pub fn drive(&mut self, to: Position) -> Result<()> {
        while self.energy > 0 {
            let Some(leg) = driving_directions(self.position, to) else {
                break;
            };
            let distance = leg.distance.min(self.rules.affordable_distance(self.energy));
            if distance <= 0 {
                break;
            }

            self.call(
                ServerMethod::Drive,
                &[
                    ("direction", leg.direction.code().to_string()),
                    ("distance", distance.to_string()),
                ],
            )?;
            self.spend(distance * self.rules.drive_cost);
            self.position = self.position.step(leg.direction, distance);
            debug!(
                direction = ?leg.direction,
                distance,
                x = self.position.x,
                y = self.position.y,
                "drove"
            );
        }
        Ok(())
    }

    /// Scan a cone centred on `angle`. Returns the targets seen, if any.
    pub fn scan(&mut self, angle: f64) -> Result<Vec<Target>> {
        let body = self.call(ServerMethod::Scan, &[("degree", format_angle(angle)?)])?;
        self.spend(self.rules.scan_cost);
        self.log.ws(&format!("SCAN: {body}"));

        let targets: Vec<Target> = parse_scan(&body)?
            .into_iter()
            .map(|hit| {
                let target =
                    Target::from_sighting(self.position, hit.angle, hit.distance, hit.condition);
                self.log.debug(&format!(
                    "TARGET: ({}, {}) calc {:.2}, {:.2} reported {}, {}",
                    target.position.x,
                    target.position.y,
                    target.angle_from(self.position),
                    target.distance_from(self.position),
                    hit.angle,
                    hit.distance,
                ));
                target
            })
            .collect();
        debug!(angle, found = targets.len(), "scanned");
        Ok(targets)
    }

    /// Read a variable stored by an earlier turn.
    ///
    /// Returns `None` when unset or when the stored value no longer fits `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.vars.get(name)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(name, error = %err, "stored variable has unexpected shape");
                None
            }
        }
    }

    /// Store a variable for later turns.
    pub fn set<T: Serialize>(&mut self, name: &str, value: T) -> Result<()> {
        let value =
            serde_json::to_value(value).with_context(|| format!("serialize variable {name}"))?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    /// Write a line to the bot log on the `user` channel.
    pub fn log(&self, message: &str) {
        self.log.write(Channel::User, message);
    }

    /// Variables to persist once the turn is over.
    pub fn into_vars(self) -> BTreeMap<String, Value> {
        self.vars
    }

    fn call(&self, method: ServerMethod, params: &[(&'static str, String)]) -> Result<String> {
        if self.log.enabled(Channel::Ws) {
            let query = call_params(&self.endpoint, method, params);
            let encoded = serde_urlencoded::to_string(&query).unwrap_or_default();
            self.log.ws(&format!("Call WS: {}?{}", self.endpoint.url, encoded));
        }
        let body = self.server.call(&self.endpoint, method, params)?;
        self.log.ws(&format!("WS response: {body}"));
        Ok(body)
    }

    fn spend(&mut self, cost: i64) {
        self.energy = (self.energy - cost.max(0)).max(0);
    }
}

/// Angles go over the wire in `[0, 360)`, as plain decimals without
/// trailing zeros.
fn format_angle(angle: f64) -> Result<String> {
    if !angle.is_finite() {
        bail!("angle must be a finite number of degrees, got {angle}");
    }
    let rounded = normalize_degrees((angle * 100.0).round() / 100.0);
    if rounded.fract() == 0.0 {
        Ok(format!("{}", rounded as i64))
    } else {
        Ok(format!("{rounded}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedServer;

    fn endpoint() -> Endpoint {
        Endpoint {
            url: "http://arena.test/wbb".to_string(),
            client_key: "k".to_string(),
            game_id: "g1".to_string(),
        }
    }

    fn bot<'a>(server: &'a ScriptedServer, log: &'a GameLog, energy: i64) -> Bot<'a> {
        Bot::spawn(BotInit {
            position: Position::new(100, 100),
            energy,
            armor: 5,
            rules: ArenaRules::default(),
            vars: BTreeMap::new(),
            endpoint: endpoint(),
            server,
            log,
        })
    }

    #[test]
    fn fire_clamps_to_available_energy() {
        let server = ScriptedServer::new(vec![ScriptedServer::fire_reply(1)]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 30);

        let hits = bot.fire(90.0, 50).expect("fire");
        assert_eq!(hits, 1);
        assert_eq!(bot.energy(), 0);

        let calls = server.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, ServerMethod::Fire);
        assert_eq!(calls[0].param("energy"), Some("30"));
        assert_eq!(calls[0].param("degree"), Some("90"));
    }

    #[test]
    fn drive_walks_both_axes_and_tracks_position() {
        let server = ScriptedServer::new(vec![String::new(), String::new()]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 100);

        bot.drive(Position::new(130, 90)).expect("drive");
        assert_eq!(bot.position(), Position::new(130, 90));
        assert_eq!(bot.energy(), 60);

        let calls = server.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].param("direction"), Some("3"));
        assert_eq!(calls[0].param("distance"), Some("30"));
        assert_eq!(calls[1].param("direction"), Some("2"));
        assert_eq!(calls[1].param("distance"), Some("10"));
    }

    #[test]
    fn drive_stops_when_energy_runs_out() {
        let server = ScriptedServer::new(vec![String::new()]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 25);

        bot.drive(Position::new(100, 200)).expect("drive");
        assert_eq!(bot.position(), Position::new(100, 125));
        assert_eq!(bot.energy(), 0);
        assert_eq!(server.calls().len(), 1);
    }

    #[test]
    fn drive_to_current_position_is_a_no_op() {
        let server = ScriptedServer::new(Vec::new());
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 25);
        bot.drive(Position::new(100, 100)).expect("drive");
        assert!(server.calls().is_empty());
    }

    #[test]
    fn scan_charges_cost_and_locates_targets() {
        let server = ScriptedServer::new(vec![ScriptedServer::scan_reply(&[(0.0, 50.0, 70)])]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 20);

        let targets = bot.scan(0.0).expect("scan");
        assert_eq!(bot.energy(), 13);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].position, Position::new(150, 100));
        assert_eq!(targets[0].condition, 70);
    }

    #[test]
    fn scan_never_drives_energy_negative() {
        let server = ScriptedServer::new(vec![ScriptedServer::scan_reply(&[])]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 3);
        assert!(bot.scan(45.0).expect("scan").is_empty());
        assert_eq!(bot.energy(), 0);
    }

    #[test]
    fn variables_round_trip_through_json() {
        let server = ScriptedServer::new(Vec::new());
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 0);

        bot.set("sweep", 40_i64).expect("set");
        assert!(bot.contains("sweep"));
        assert_eq!(bot.get::<i64>("sweep"), Some(40));
        assert_eq!(bot.get::<String>("sweep"), None);
        assert!(bot.remove("sweep"));
        assert!(!bot.contains("sweep"));
    }

    #[test]
    fn angles_are_formatted_compactly() {
        let formatted = |angle: f64| format_angle(angle).expect("finite");
        assert_eq!(formatted(90.0), "90");
        assert_eq!(formatted(12.346), "12.35");
        assert_eq!(formatted(359.999), "0");
        assert_eq!(formatted(-90.5), "269.5");
        assert_eq!(formatted(450.0), "90");
    }

    #[test]
    fn non_finite_angles_never_reach_the_server() {
        assert!(format_angle(f64::NAN).is_err());
        assert!(format_angle(f64::INFINITY).is_err());

        let server = ScriptedServer::new(vec![ScriptedServer::fire_reply(1)]);
        let log = GameLog::disabled();
        let mut bot = bot(&server, &log, 30);
        assert!(bot.scan(f64::NAN).is_err());
        assert!(bot.fire(f64::NEG_INFINITY, 10).is_err());
        assert!(server.calls().is_empty());
        assert_eq!(bot.energy(), 30);
    }
}
