//! Arena geometry: driving directions, bearings and distances.
//!
//! The arena uses integer coordinates with `y` growing "down" (south). Angles
//! are degrees measured from the positive x axis toward positive y, matching
//! the angles the game server reports in scan results.

use serde::{Deserialize, Serialize};

/// A point in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Position after driving `distance` units in `direction`.
    pub fn step(self, direction: Direction, distance: i64) -> Self {
        match direction {
            Direction::West => Self::new(self.x - distance, self.y),
            Direction::North => Self::new(self.x, self.y - distance),
            Direction::East => Self::new(self.x + distance, self.y),
            Direction::South => Self::new(self.x, self.y + distance),
        }
    }
}

/// Compass direction as understood by the game server's `drive` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    West,
    North,
    East,
    South,
}

impl Direction {
    /// Numeric code sent as the `direction` query parameter.
    pub fn code(self) -> u8 {
        match self {
            Direction::West => 1,
            Direction::North => 2,
            Direction::East => 3,
            Direction::South => 4,
        }
    }
}

/// A single straight-line move along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveLeg {
    pub direction: Direction,
    pub distance: i64,
}

/// Next leg toward `to`, travelling the axis with the larger remaining offset.
///
/// Ties go to the y axis. Returns `None` once `from == to`.
pub fn driving_directions(from: Position, to: Position) -> Option<DriveLeg> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }

    let leg = if dx.abs() > dy.abs() {
        DriveLeg {
            direction: if dx < 0 {
                Direction::West
            } else {
                Direction::East
            },
            distance: dx.abs(),
        }
    } else {
        DriveLeg {
            direction: if dy < 0 {
                Direction::North
            } else {
                Direction::South
            },
            distance: dy.abs(),
        }
    };
    Some(leg)
}

/// Point at `distance` from `origin` along `angle_deg`, rounded to the grid.
pub fn project(origin: Position, angle_deg: f64, distance: f64) -> Position {
    let rad = angle_deg.to_radians();
    Position::new(
        (origin.x as f64 + rad.cos() * distance).round() as i64,
        (origin.y as f64 + rad.sin() * distance).round() as i64,
    )
}

/// Angle in degrees `[0, 360)` from `from` toward `to`.
pub fn bearing(from: Position, to: Position) -> f64 {
    let dy = (to.y - from.y) as f64;
    let dx = (to.x - from.x) as f64;
    normalize_degrees(dy.atan2(dx).to_degrees())
}

/// Euclidean distance between two points.
pub fn distance(from: Position, to: Position) -> f64 {
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    dx.hypot(dy)
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs due to rounding.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
