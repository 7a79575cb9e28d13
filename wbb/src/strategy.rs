//! Turn handlers: the logic that decides what a bot does each round.
//!
//! Any [`TurnHandler`] can drive a bot; two built-ins are selectable from the
//! config file.

use std::fmt;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bot::Bot;
use crate::core::geometry::{Position, normalize_degrees, project};
use crate::core::target::Target;

/// Logic run once per round with the restored bot.
pub trait TurnHandler {
    fn name(&self) -> &'static str;

    /// One-paragraph, human-readable summary shown by `describe`.
    fn description(&self) -> &'static str;

    fn take_turn(&self, bot: &mut Bot<'_>) -> Result<()>;
}

/// Built-in handlers selectable from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Sentry,
    Hunter,
}

impl StrategyKind {
    pub fn handler(self) -> Box<dyn TurnHandler + Send + Sync> {
        match self {
            StrategyKind::Sentry => Box::new(Sentry),
            StrategyKind::Hunter => Box::new(Hunter::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Sentry => f.write_str("sentry"),
            StrategyKind::Hunter => f.write_str("hunter"),
        }
    }
}

const SWEEP: &str = "sweep";
const QUARRY: &str = "quarry";

/// Weakest target within `range` of `origin`, nearest first on ties.
pub fn weakest_in_range(targets: &[Target], origin: Position, range: f64) -> Option<Target> {
    targets
        .iter()
        .filter(|target| target.distance_from(origin) <= range)
        .min_by(|a, b| {
            a.condition
                .cmp(&b.condition)
                .then_with(|| a.distance_from(origin).total_cmp(&b.distance_from(origin)))
        })
        .copied()
}

fn next_sweep(bot: &Bot<'_>, sweep: f64) -> f64 {
    let step = bot.rules().scan_degrees.max(1) as f64;
    normalize_degrees(sweep + step)
}

/// Stationary turret: sweeps the arena one scan cone per round and unloads
/// on the weakest bot it sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sentry;

impl TurnHandler for Sentry {
    fn name(&self) -> &'static str {
        "sentry"
    }

    fn description(&self) -> &'static str {
        "Stays put, sweeps its scanner one cone per round and fires every \
         remaining unit of energy at the weakest bot in range."
    }

    fn take_turn(&self, bot: &mut Bot<'_>) -> Result<()> {
        let sweep = bot.get::<f64>(SWEEP).unwrap_or(0.0);
        if bot.energy() < bot.rules().scan_cost {
            bot.log("too little energy to scan, resting");
            return Ok(());
        }

        let targets = bot.scan(sweep)?;
        let origin = bot.position();
        let range = bot.rules().fire_range as f64;
        match weakest_in_range(&targets, origin, range) {
            Some(target) => {
                let angle = target.angle_from(origin);
                let energy = bot.energy();
                let hits = bot.fire(angle, energy)?;
                bot.log(&format!("fired at {angle:.1} degrees, hit {hits}"));
            }
            None => {
                let next = next_sweep(bot, sweep);
                debug!(sweep, next, "nothing in range, advancing sweep");
                bot.set(SWEEP, next)?;
            }
        }
        Ok(())
    }
}

/// Mobile hunter: locks onto a target, closes to firing range and keeps
/// tracking it across rounds. Wanders when nothing is in sight.
#[derive(Debug, Clone, Copy)]
pub struct Hunter {
    /// Largest random hop, per axis, when wandering.
    pub wander_radius: i64,
}

impl Default for Hunter {
    fn default() -> Self {
        Self { wander_radius: 60 }
    }
}

impl Hunter {
    /// Energy kept back after moving so the bot can still scan and shoot.
    fn reserve(bot: &Bot<'_>) -> i64 {
        bot.rules().scan_cost + bot.rules().fire_base_cost + 1
    }

    fn approach(&self, bot: &mut Bot<'_>, quarry: Target) -> Result<()> {
        let origin = bot.position();
        let range = bot.rules().fire_range as f64;
        let gap = quarry.distance_from(origin) - range * 0.5;
        let budget = bot
            .rules()
            .affordable_distance(bot.energy() - Self::reserve(bot));
        if gap <= 0.0 || budget <= 0 {
            return Ok(());
        }

        // Driving is axis by axis, so a diagonal costs |cos| + |sin| per unit.
        let angle = quarry.angle_from(origin);
        let rad = angle.to_radians();
        let manhattan = rad.cos().abs() + rad.sin().abs();
        let step = gap.min(budget as f64 / manhattan.max(1.0)).floor();
        if step < 1.0 {
            return Ok(());
        }
        let waypoint = project(origin, angle, step);
        debug!(x = waypoint.x, y = waypoint.y, "closing in");
        bot.drive(waypoint)
    }

    fn wander(&self, bot: &mut Bot<'_>) -> Result<()> {
        let budget = bot
            .rules()
            .affordable_distance((bot.energy() - Self::reserve(bot)) / 2);
        let radius = self.wander_radius.min(budget / 2);
        if radius <= 0 {
            return Ok(());
        }
        let mut rng = rand::thread_rng();
        let origin = bot.position();
        let waypoint = Position::new(
            origin.x + rng.gen_range(-radius..=radius),
            origin.y + rng.gen_range(-radius..=radius),
        );
        debug!(x = waypoint.x, y = waypoint.y, "wandering");
        bot.drive(waypoint)
    }
}

impl TurnHandler for Hunter {
    fn name(&self) -> &'static str {
        "hunter"
    }

    fn description(&self) -> &'static str {
        "Tracks the weakest bot it has seen by absolute position, drives into \
         firing range and shoots; wanders and sweeps when it has lost its quarry."
    }

    fn take_turn(&self, bot: &mut Bot<'_>) -> Result<()> {
        let sweep = bot.get::<f64>(SWEEP).unwrap_or(0.0);
        let remembered = bot.get::<Target>(QUARRY);
        let origin = bot.position();

        let mut quarry = remembered;
        if bot.energy() >= bot.rules().scan_cost {
            let look = remembered.map_or(sweep, |target| target.angle_from(origin));
            let targets = bot.scan(look)?;
            quarry = weakest_in_range(&targets, origin, f64::INFINITY);
            if quarry.is_none() && remembered.is_none() {
                let next = next_sweep(bot, sweep);
                bot.set(SWEEP, next)?;
            }
        }

        let Some(target) = quarry else {
            if remembered.is_some() {
                bot.log("lost quarry");
            }
            bot.remove(QUARRY);
            return self.wander(bot);
        };
        bot.set(QUARRY, target)?;

        let range = bot.rules().fire_range as f64;
        if target.distance_from(bot.position()) > range {
            self.approach(bot, target)?;
        }
        if target.distance_from(bot.position()) <= range
            && bot.rules().affordable_shot(bot.energy()) > 0
        {
            let angle = target.angle_from(bot.position());
            let energy = bot.energy();
            let hits = bot.fire(angle, energy)?;
            bot.log(&format!(
                "fired at ({}, {}), hit {hits}",
                target.position.x, target.position.y
            ));
        }
        Ok(())
    }
}
