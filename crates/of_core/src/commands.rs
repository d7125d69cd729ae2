//! The command surface consumed by input layers.
//!
//! Commands execute synchronously between tick boundaries. Invalid
//! commands are rejected with an error and change no state; commands
//! addressed to incapacitated units are silently ignored, except
//! CEASE_FIRE which is a harmless no-op either way.

use serde::{Deserialize, Serialize};

use crate::attack;
use crate::character::{AimingSpeed, MovementType, TargetZone};
use crate::error::{CoreError, Result};
use crate::events::EventFilter;
use crate::game_state::GameState;
use crate::math::Vec2;
use crate::state_machine::{self, STATE_FIRING, STATE_MELEE_ATTACKING, STATE_RECOVERING};
use crate::targeting;
use crate::units::UnitId;
use crate::weapons::{FiringMode, Weapon};

/// A player (or script) command addressed to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Mark a unit selected (informational only).
    SelectUnit {
        /// Unit to select.
        unit: UnitId,
    },
    /// Order a unit to move to a destination.
    MoveTo {
        /// Moving unit.
        unit: UnitId,
        /// World destination in pixels.
        destination: Vec2,
    },
    /// Attack a specific unit; manual targeting overrides any zone.
    AttackTarget {
        /// Attacking unit.
        attacker: UnitId,
        /// Unit to attack.
        target: UnitId,
    },
    /// Stop attacking but keep facing the target; resumable.
    CeaseFire {
        /// Unit ceasing fire.
        unit: UnitId,
    },
    /// Flip auto-targeting; enabling runs the evaluator immediately.
    ToggleAutoTarget {
        /// Unit to toggle.
        unit: UnitId,
    },
    /// Swap RANGED and MELEE, resetting weapon states and hold state.
    ToggleCombatMode {
        /// Unit to toggle.
        unit: UnitId,
    },
    /// Advance the hold-state preference through the active weapon's
    /// holdable states.
    CycleHoldState {
        /// Unit to adjust.
        unit: UnitId,
    },
    /// Set the movement gait, clamped by leg wounds.
    SetMovementType {
        /// Unit to adjust.
        unit: UnitId,
        /// Requested gait.
        movement: MovementType,
    },
    /// Set aiming deliberateness; takes effect on the next hit roll.
    SetAimingSpeed {
        /// Unit to adjust.
        unit: UnitId,
        /// Requested aiming speed.
        speed: AimingSpeed,
    },
    /// Define or replace the unit's target zone.
    DefineTargetZone {
        /// Unit to adjust.
        unit: UnitId,
        /// Zone rectangle in world coordinates.
        zone: TargetZone,
    },
    /// Remove the unit's target zone.
    ClearTargetZone {
        /// Unit to adjust.
        unit: UnitId,
    },
    /// Select a firing mode; validated against the weapon.
    SetFiringMode {
        /// Unit to adjust.
        unit: UnitId,
        /// Requested mode.
        mode: FiringMode,
    },
    /// Pause the simulation clock.
    Pause,
    /// Resume the simulation clock.
    Resume,
}

/// Apply a command to the game state.
pub(crate) fn apply(gs: &mut GameState, command: Command) -> Result<()> {
    match command {
        Command::Pause => {
            gs.paused = true;
            return Ok(());
        }
        Command::Resume => {
            gs.paused = false;
            return Ok(());
        }
        _ => {}
    }

    let unit_id = match &command {
        Command::SelectUnit { unit }
        | Command::MoveTo { unit, .. }
        | Command::CeaseFire { unit }
        | Command::ToggleAutoTarget { unit }
        | Command::ToggleCombatMode { unit }
        | Command::CycleHoldState { unit }
        | Command::SetMovementType { unit, .. }
        | Command::SetAimingSpeed { unit, .. }
        | Command::DefineTargetZone { unit, .. }
        | Command::ClearTargetZone { unit }
        | Command::SetFiringMode { unit, .. } => *unit,
        Command::AttackTarget { attacker, .. } => *attacker,
        Command::Pause | Command::Resume => unreachable!("handled above"),
    };

    let unit = gs
        .units
        .get(unit_id)
        .ok_or(CoreError::UnitNotFound(unit_id))?;
    if unit.character.incapacitated {
        // Downed units take no orders; cease fire is a no-op anyway.
        tracing::debug!(unit = unit_id, ?command, "command to incapacitated unit ignored");
        return Ok(());
    }

    match command {
        Command::SelectUnit { unit } => {
            if let Some(u) = gs.units.get_mut(unit) {
                u.selected = true;
            }
            Ok(())
        }
        Command::MoveTo { unit, destination } => {
            if let Some(u) = gs.units.get_mut(unit) {
                u.destination = Some(destination);
            }
            Ok(())
        }
        Command::AttackTarget { attacker, target } => {
            attack::initiate_attack(gs, attacker, target).map_err(|err| {
                tracing::warn!(attacker, target, %err, "attack command rejected");
                err
            })
        }
        Command::CeaseFire { unit } => {
            gs.queue.cancel_owned(unit, EventFilter::Any);
            if let Some(u) = gs.units.get_mut(unit) {
                u.character.is_attacking = false;
                u.character.attack_cycle_done = false;
                // Target, facing cache, weapon state, and accumulated
                // aiming time all survive so the attack can resume.
            }
            Ok(())
        }
        Command::ToggleAutoTarget { unit } => {
            let enabled = {
                let u = gs.units.get_mut(unit).expect("checked above");
                u.character.auto_target = !u.character.auto_target;
                u.character.auto_target
            };
            // Evaluate immediately on enable, unless an attack is
            // mid-cycle; completion will trigger the evaluator then.
            if enabled && !attack::mid_attack_cycle(gs, unit) {
                targeting::evaluate_and_engage(gs, unit);
            }
            Ok(())
        }
        Command::ToggleCombatMode { unit } => {
            gs.queue.cancel_owned(unit, EventFilter::StateAdvances);
            if let Some(u) = gs.units.get_mut(unit) {
                let character = &mut u.character;
                character.combat_mode = character.combat_mode.toggled();
                character.hold_state = crate::character::DEFAULT_HOLD_STATE.to_string();
                character.is_attacking = false;
            }
            state_machine::reset_weapon_states(gs, unit);
            Ok(())
        }
        Command::CycleHoldState { unit } => {
            cycle_hold_state(gs, unit);
            Ok(())
        }
        Command::SetMovementType { unit, movement } => {
            if let Some(u) = gs.units.get_mut(unit) {
                let cap = u.character.movement_cap();
                u.character.movement_type = movement.min(cap);
            }
            Ok(())
        }
        Command::SetAimingSpeed { unit, speed } => {
            if let Some(u) = gs.units.get_mut(unit) {
                u.character.aiming_speed = speed;
            }
            Ok(())
        }
        Command::DefineTargetZone { unit, zone } => {
            if let Some(u) = gs.units.get_mut(unit) {
                u.character.target_zone = Some(zone);
            }
            Ok(())
        }
        Command::ClearTargetZone { unit } => {
            if let Some(u) = gs.units.get_mut(unit) {
                u.character.target_zone = None;
            }
            Ok(())
        }
        Command::SetFiringMode { unit, mode } => set_firing_mode(gs, unit, mode),
        Command::Pause | Command::Resume => unreachable!("handled above"),
    }
}

/// States excluded from the hold-state cycle: transient attack and
/// reload states cannot be held.
fn holdable(name: &str) -> bool {
    !matches!(
        name,
        STATE_FIRING | STATE_RECOVERING | STATE_MELEE_ATTACKING | "reloading"
    )
}

fn cycle_hold_state(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let weapon_id = unit.character.active_weapon_id().clone();
    let Some(weapon) = gs.weapons.get(&weapon_id) else {
        return;
    };
    let holdable_states: Vec<String> = weapon
        .common()
        .states
        .iter()
        .map(|s| s.name.clone())
        .filter(|name| holdable(name))
        .collect();
    if holdable_states.is_empty() {
        return;
    }
    let current = unit.character.hold_state.clone();
    let next = match holdable_states.iter().position(|s| *s == current) {
        Some(index) => holdable_states[(index + 1) % holdable_states.len()].clone(),
        None => holdable_states[0].clone(),
    };
    if let Some(unit) = gs.units.get_mut(id) {
        unit.character.hold_state = next;
    }
}

fn set_firing_mode(gs: &mut GameState, id: UnitId, mode: FiringMode) -> Result<()> {
    let Some(unit) = gs.units.get(id) else {
        return Err(CoreError::UnitNotFound(id));
    };
    let Some(carried) = unit.character.ranged.as_ref() else {
        return Err(CoreError::InvalidCommand(format!(
            "{} carries no ranged weapon",
            unit.character.name
        )));
    };
    let supported = match gs.weapons.get(&carried.weapon) {
        Some(Weapon::Ranged(w)) => w.modes.contains(&mode),
        _ => false,
    };
    if !supported {
        tracing::warn!(unit = id, ?mode, "unsupported firing mode rejected");
        return Err(CoreError::InvalidCommand(format!(
            "weapon does not support {mode:?} fire"
        )));
    }
    if let Some(u) = gs.units.get_mut(id) {
        if let Some(carried) = u.character.ranged.as_mut() {
            carried.firing_mode = mode;
            carried.burst_fired = 0;
        }
    }
    Ok(())
}
