//! World units, conversions, and angle math.
//!
//! The simulation measures time in integer ticks and space in pixels:
//! 60 ticks make one second and 7 pixels make one foot. Weapon data is
//! authored in feet and feet-per-second and converted on use.
//!
//! Facings are degrees with 0 = north and positive angles clockwise.
//! The world is y-up: a unit at the origin facing 0 degrees looks toward
//! positive y, and facing 90 degrees looks toward positive x.

use serde::{Deserialize, Serialize};

/// Simulation ticks per second.
pub const TICKS_PER_SECOND: u32 = 60;

/// Pixels per foot of world distance.
pub const PIXELS_PER_FOOT: f64 = 7.0;

/// Rotation rate in degrees per tick (360 degrees per second).
pub const ROTATION_DEGREES_PER_TICK: f64 = 6.0;

/// Rotations smaller than this snap to the target facing in one tick.
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Convert a distance in feet to pixels.
#[must_use]
pub fn feet_to_pixels(feet: f64) -> f64 {
    feet * PIXELS_PER_FOOT
}

/// Convert a distance in pixels to feet.
#[must_use]
pub fn pixels_to_feet(pixels: f64) -> f64 {
    pixels / PIXELS_PER_FOOT
}

/// Convert a speed in feet per second to pixels per tick.
#[must_use]
pub fn fps_to_pixels_per_tick(feet_per_second: f64) -> f64 {
    feet_to_pixels(feet_per_second) / f64::from(TICKS_PER_SECOND)
}

/// 2D world position or offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate (east positive).
    pub x: f64,
    /// Y coordinate (north positive).
    pub y: f64,
}

impl Vec2 {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Scale to unit length. Returns zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Normalize an angle in degrees to the range [0, 360).
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Compass bearing in degrees from one point toward another.
///
/// 0 = north (+y), 90 = east (+x), continuing clockwise. For
/// coincident points this returns 0.
#[must_use]
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    normalize_degrees(dx.atan2(dy).to_degrees())
}

/// Signed shortest arc from `from` to `to`, in degrees.
///
/// Result is in (-180, 180]: positive means rotate clockwise. Wrapping
/// across 359 -> 0 is chosen whenever it is the shorter path.
#[must_use]
pub fn shortest_arc_degrees(from: f64, to: f64) -> f64 {
    let diff = normalize_degrees(to) - normalize_degrees(from);
    if diff > 180.0 {
        diff - 360.0
    } else if diff <= -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Advance a facing one tick toward a target facing.
///
/// Arcs under [`ROTATION_SNAP_DEGREES`] complete immediately; larger
/// arcs turn at [`ROTATION_DEGREES_PER_TICK`] along the shortest path.
#[must_use]
pub fn rotate_toward(current: f64, target: f64) -> f64 {
    let arc = shortest_arc_degrees(current, target);
    if arc.abs() < ROTATION_SNAP_DEGREES {
        normalize_degrees(target)
    } else if arc > 0.0 {
        normalize_degrees(current + ROTATION_DEGREES_PER_TICK)
    } else {
        normalize_degrees(current - ROTATION_DEGREES_PER_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feet_pixel_conversion() {
        assert_eq!(feet_to_pixels(10.0), 70.0);
        assert_eq!(pixels_to_feet(70.0), 10.0);
    }

    #[test]
    fn test_fps_to_pixels_per_tick() {
        // 6 feet/second = 42 px/second = 0.7 px/tick
        let per_tick = fps_to_pixels_per_tick(6.0);
        assert!((per_tick - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_bearing_cardinals() {
        let origin = Vec2::ZERO;
        assert_eq!(bearing_degrees(origin, Vec2::new(0.0, 10.0)), 0.0);
        assert_eq!(bearing_degrees(origin, Vec2::new(10.0, 0.0)), 90.0);
        assert_eq!(bearing_degrees(origin, Vec2::new(0.0, -10.0)), 180.0);
        assert_eq!(bearing_degrees(origin, Vec2::new(-10.0, 0.0)), 270.0);
    }

    #[test]
    fn test_bearing_diagonal() {
        // From (0,100) toward (100,0): east and south -> southeast.
        let b = bearing_degrees(Vec2::new(0.0, 100.0), Vec2::new(100.0, 0.0));
        assert!((b - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_shortest_arc_wraps() {
        assert!((shortest_arc_degrees(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((shortest_arc_degrees(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((shortest_arc_degrees(0.0, 180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_snaps_small_arcs() {
        assert_eq!(rotate_toward(0.0, 14.0), 14.0);
        assert_eq!(rotate_toward(359.0, 5.0), 5.0);
    }

    #[test]
    fn test_rotate_steps_large_arcs() {
        assert_eq!(rotate_toward(0.0, 90.0), 6.0);
        // Shortest path from 0 to 270 is counter-clockwise.
        assert_eq!(rotate_toward(0.0, 270.0), 354.0);
    }
}
