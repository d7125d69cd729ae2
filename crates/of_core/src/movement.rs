//! Per-tick movement and facing updates.
//!
//! Movement advances a unit toward its destination at the gait's speed,
//! clamped by leg wounds. Facing resolves in a strict priority order: a
//! combat target always wins over the movement destination, so a unit
//! can run one way while keeping its weapon trained another.

use crate::character::CombatMode;
use crate::game_state::GameState;
use crate::math::{self, bearing_degrees, fps_to_pixels_per_tick};
use crate::units::UnitId;

/// Update one unit's pursuit, position, and facing for this tick.
///
/// Called in ascending unit-id order. Incapacitated characters neither
/// move nor rotate.
pub(crate) fn update_unit(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    if unit.character.incapacitated {
        return;
    }

    update_melee_pursuit(gs, id);
    integrate_position(gs, id);
    update_facing(gs, id);
}

/// While attacking in melee, chase the target until within reach.
///
/// The destination is re-issued every tick from the target's current
/// position, so a fleeing target is followed rather than chased to a
/// stale point.
fn update_melee_pursuit(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let character = &unit.character;
    if character.effective_mode() != CombatMode::Melee || !character.is_attacking {
        return;
    }
    let Some(target_id) = character.target else {
        return;
    };
    let Some(target) = gs.units.get(target_id) else {
        return;
    };
    if target.character.incapacitated {
        return;
    }

    let reach = gs.melee_reach_pixels(id);
    let in_reach = unit.position.distance(target.position) <= unit.radius + target.radius + reach;
    let destination = if in_reach { None } else { Some(target.position) };
    if let Some(unit) = gs.units.get_mut(id) {
        unit.destination = destination;
    }
}

/// Move toward the destination by one tick's travel, arriving exactly.
fn integrate_position(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    let Some(destination) = unit.destination else {
        return;
    };

    let gait = unit.character.effective_movement();
    let step = fps_to_pixels_per_tick(gait.speed_fps());
    let offset = destination - unit.position;
    let distance = offset.length();

    if distance <= step {
        unit.position = destination;
        unit.destination = None;
    } else {
        unit.position = unit.position + offset.normalized() * step;
    }
}

/// Resolve the desired facing and rotate one tick toward it.
///
/// Priority: (1) bearing to the combat target, (2) bearing to the
/// movement destination, (3) hold the last facing. Rule (1) always wins
/// so auto-targeting units do not swing toward their move destination
/// mid-fight.
fn update_facing(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };

    let target_bearing = unit
        .character
        .target
        .and_then(|tid| gs.units.get(tid))
        .map(|target| bearing_degrees(unit.position, target.position));

    let desired = if let Some(bearing) = target_bearing {
        Some(bearing)
    } else {
        unit.destination
            .map(|dest| bearing_degrees(unit.position, dest))
    };

    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    if let Some(bearing) = desired {
        unit.target_facing = bearing;
    }
    if target_bearing.is_some() {
        unit.character.last_target_facing = Some(unit.target_facing);
    }
    unit.facing = math::rotate_toward(unit.facing, unit.target_facing);
}
