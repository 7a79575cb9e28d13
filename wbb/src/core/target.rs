//! Enemy bots spotted by a scan.

use serde::{Deserialize, Serialize};

use crate::core::geometry::{Position, bearing, distance, project};

/// A sighted enemy, stored by absolute position.
///
/// Scans report angle and distance relative to the scanning bot. Keeping the
/// absolute position lets a strategy recompute both after the bot has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub position: Position,
    /// Remaining health; higher is healthier.
    pub condition: i64,
}

impl Target {
    pub fn from_sighting(origin: Position, angle: f64, range: f64, condition: i64) -> Self {
        Self {
            position: project(origin, angle, range),
            condition,
        }
    }

    /// Angle in degrees `[0, 360)` from `origin` to this target.
    pub fn angle_from(&self, origin: Position) -> f64 {
        bearing(origin, self.position)
    }

    pub fn distance_from(&self, origin: Position) -> f64 {
        distance(origin, self.position)
    }
}
