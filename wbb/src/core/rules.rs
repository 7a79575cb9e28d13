//! Arena rules announced by the game server at `gameInit`.

use serde::{Deserialize, Serialize};

/// Costs and ranges that govern bot actions for one game.
///
/// Missing values fall back to the arena's published defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaRules {
    /// Maximum distance a scan can see.
    pub scan_range: i64,
    /// Width of the scan cone in degrees.
    pub scan_degrees: i64,
    /// Energy spent per scan.
    pub scan_cost: i64,
    /// Energy spent per unit driven.
    pub drive_cost: i64,
    /// Width of a shot in degrees.
    pub fire_width: i64,
    /// Maximum distance a shot travels.
    pub fire_range: i64,
    /// Flat energy cost of firing, on top of the shot's own energy.
    pub fire_base_cost: i64,
}

impl Default for ArenaRules {
    fn default() -> Self {
        Self {
            scan_range: 300,
            scan_degrees: 10,
            scan_cost: 7,
            drive_cost: 1,
            fire_width: 2,
            fire_range: 300,
            fire_base_cost: 0,
        }
    }
}

impl ArenaRules {
    /// Longest distance affordable with `energy`.
    pub fn affordable_distance(&self, energy: i64) -> i64 {
        if self.drive_cost <= 0 {
            return i64::MAX;
        }
        energy.max(0) / self.drive_cost
    }

    /// Largest shot energy affordable with `energy`, after the base cost.
    pub fn affordable_shot(&self, energy: i64) -> i64 {
        (energy - self.fire_base_cost).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affordable_distance_respects_drive_cost() {
        let rules = ArenaRules {
            drive_cost: 3,
            ..ArenaRules::default()
        };
        assert_eq!(rules.affordable_distance(10), 3);
        assert_eq!(rules.affordable_distance(-4), 0);
    }

    #[test]
    fn free_driving_is_unbounded() {
        let rules = ArenaRules {
            drive_cost: 0,
            ..ArenaRules::default()
        };
        assert_eq!(rules.affordable_distance(0), i64::MAX);
    }

    #[test]
    fn affordable_shot_subtracts_base_cost() {
        let rules = ArenaRules {
            fire_base_cost: 5,
            ..ArenaRules::default()
        };
        assert_eq!(rules.affordable_shot(20), 15);
        assert_eq!(rules.affordable_shot(3), 0);
    }
}
