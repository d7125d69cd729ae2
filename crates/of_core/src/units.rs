//! Units and the roster that owns them.
//!
//! A unit is the physical instance on the field; its combat state lives
//! in the embedded [`Character`]. Units reference each other only by
//! [`UnitId`], resolved through the [`UnitRoster`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::math::Vec2;

/// Unique identifier for units.
pub type UnitId = u32;

/// Collision/reach radius of every unit, in pixels.
pub const UNIT_RADIUS: f64 = 10.5;

/// A physical combatant on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// World position in pixels.
    pub position: Vec2,
    /// Body radius in pixels.
    pub radius: f64,
    /// Current facing in degrees, 0 = north, clockwise.
    pub facing: f64,
    /// Facing the unit is rotating toward.
    pub target_facing: f64,
    /// Movement destination, if the unit is moving.
    pub destination: Option<Vec2>,
    /// Player-selection flag (informational).
    pub selected: bool,
    /// The combatant bound to this unit.
    pub character: Character,
}

impl Unit {
    /// Create a unit at a position with a given initial facing.
    #[must_use]
    pub fn new(id: UnitId, position: Vec2, facing: f64, character: Character) -> Self {
        Self {
            id,
            position,
            radius: UNIT_RADIUS,
            facing,
            target_facing: facing,
            destination: None,
            selected: false,
            character,
        }
    }

    /// Edge-to-edge distance to another unit, in pixels. Zero or
    /// negative when the bodies touch or overlap.
    #[must_use]
    pub fn edge_distance(&self, other: &Self) -> f64 {
        self.position.distance(other.position) - self.radius - other.radius
    }

    /// Whether the unit still has ground to cover this tick.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }
}

/// Storage for all units in the simulation.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration
/// via sorted ids when processing per-tick updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRoster {
    units: HashMap<UnitId, Unit>,
    next_id: UnitId,
}

impl UnitRoster {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a unit, assigning and returning its id.
    pub fn insert(&mut self, position: Vec2, facing: f64, character: Character) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, position, facing, character));
        id
    }

    /// Re-insert a unit under its recorded id (used by the save layer).
    pub fn restore(&mut self, unit: Unit) {
        self.next_id = self.next_id.max(unit.id + 1);
        self.units.insert(unit.id, unit);
    }

    /// Remove a unit by id.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Whether a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}
