//! Weapon state machine progression.
//!
//! Each carried weapon walks its own declared state graph toward a goal:
//! the character's hold state when idle, the attack state when an attack
//! is underway, or the reload state when the magazine runs dry. A
//! transition with a positive cost becomes a scheduled event; zero-cost
//! transitions apply inline in the same tick.
//!
//! Progression never passes "aiming" into "firing" unless an attack has
//! been requested, and it stops at the hold state otherwise.

use crate::character::CombatMode;
use crate::events::EventKind;
use crate::game_state::GameState;
use crate::hooks::{CombatHooks, MUZZLE_FLASH_TICKS};
use crate::units::UnitId;
use crate::weapons::{FiringMode, Weapon};

/// Ranged attack state.
pub const STATE_FIRING: &str = "firing";
/// Ranged post-shot state.
pub const STATE_RECOVERING: &str = "recovering";
/// Ranged aimed state; the default hold state.
pub const STATE_AIMING: &str = "aiming";
/// Melee attack state.
pub const STATE_MELEE_ATTACKING: &str = "melee_attacking";
/// Melee readied state.
pub const STATE_MELEE_READY: &str = "melee_ready";

/// Upper bound on inline zero-cost transitions per unit per tick, so a
/// malformed zero-cost cycle cannot hang the tick.
const MAX_CHAIN: usize = 16;

/// One pending progression step for a unit's active weapon.
enum Step {
    /// Advance along the declared `next` edge.
    Advance { mode: CombatMode, cost: u32 },
    /// Jump into the reload state (out of ammo with an attack requested).
    EnterReload { cost: u32 },
}

/// Clamp a hold-state preference to states the weapon actually declares.
fn clamped_hold<'a>(weapon: &'a Weapon, hold: &'a str) -> &'a str {
    let common = weapon.common();
    if common.state(hold).is_some() {
        return hold;
    }
    let fallback = match weapon {
        Weapon::Ranged(_) => STATE_AIMING,
        Weapon::Melee(_) => STATE_MELEE_READY,
    };
    if common.state(fallback).is_some() {
        fallback
    } else {
        &common.initial_state
    }
}

/// Whether walking the `next` edges from `from` reaches `goal` without
/// passing through an attack state. Progression only ever follows `next`
/// pointers, so a hold state "behind" the current state is unreachable
/// until a reset; the weapon holds position instead of cycling through
/// a shot it was never asked to take.
fn forward_path_exists(common: &crate::weapons::WeaponCommon, from: &str, goal: &str) -> bool {
    let mut current = from;
    for _ in 0..=common.states.len() {
        if current == goal {
            return true;
        }
        if current == STATE_FIRING || current == STATE_MELEE_ATTACKING {
            return false;
        }
        match common.state(current) {
            Some(def) => current = &def.next,
            None => return false,
        }
    }
    false
}

/// Aiming-speed scaling of the aim-to-fire transition cost.
fn aim_cost(base: u32, speed: crate::character::AimingSpeed) -> u32 {
    use crate::character::AimingSpeed;
    match speed {
        AimingSpeed::VeryCareful => base * 4,
        AimingSpeed::Careful => base * 2,
        AimingSpeed::Normal => base,
        AimingSpeed::Quick => (base / 2).max(1),
    }
}

/// Whether the unit's melee target is currently within striking reach.
fn target_in_reach(gs: &GameState, id: UnitId) -> bool {
    let Some(unit) = gs.units.get(id) else {
        return false;
    };
    let Some(target) = unit.character.target.and_then(|tid| gs.units.get(tid)) else {
        return false;
    };
    let reach = gs.melee_reach_pixels(id);
    unit.position.distance(target.position) <= unit.radius + target.radius + reach
}

/// Whether the unit's target reference points at a live unit.
fn target_alive(gs: &GameState, id: UnitId) -> bool {
    gs.units
        .get(id)
        .and_then(|u| u.character.target)
        .and_then(|tid| gs.units.get(tid))
        .is_some_and(|t| !t.character.incapacitated)
}

/// Compute the next progression step for a unit, if any is needed.
fn next_step(gs: &GameState, id: UnitId) -> Option<Step> {
    let unit = gs.units.get(id)?;
    let character = &unit.character;
    if character.incapacitated {
        return None;
    }

    let mode = character.effective_mode();
    match mode {
        CombatMode::Ranged => {
            let carried = character.ranged.as_ref()?;
            let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&carried.weapon) else {
                return None;
            };
            let current = carried.state.as_str();
            let attacking =
                character.is_attacking && !character.hesitating() && target_alive(gs, id);

            // Post-shot states always drain back toward aiming.
            if current == STATE_FIRING || current == STATE_RECOVERING {
                let cost = weapon.common.state(current)?.ticks;
                return Some(Step::Advance { mode, cost });
            }

            if attacking && carried.ammo == 0 && current != weapon.reload_state {
                return Some(Step::EnterReload {
                    cost: weapon.reload_ticks,
                });
            }

            let goal = if attacking {
                STATE_FIRING
            } else {
                clamped_hold(gs.weapons.get(&carried.weapon)?, &character.hold_state)
            };
            if current == goal {
                return None;
            }
            if !attacking && !forward_path_exists(&weapon.common, current, goal) {
                return None;
            }
            let def = weapon.common.state(current)?;
            let cost = if current == STATE_AIMING && goal == STATE_FIRING {
                aim_cost(def.ticks, character.aiming_speed)
            } else {
                def.ticks
            };
            Some(Step::Advance { mode, cost })
        }
        CombatMode::Melee => {
            let Some(Weapon::Melee(weapon)) = gs.weapons.get(&character.melee.weapon) else {
                return None;
            };
            let current = character.melee.state.as_str();

            if current == STATE_MELEE_ATTACKING {
                let cost = weapon.common.state(current)?.ticks;
                return Some(Step::Advance { mode, cost });
            }

            let attacking = character.is_attacking
                && !character.hesitating()
                && character.can_melee_attack(gs.current_tick())
                && target_alive(gs, id)
                && target_in_reach(gs, id);
            let goal = if attacking {
                STATE_MELEE_ATTACKING
            } else {
                clamped_hold(gs.weapons.get(&character.melee.weapon)?, &character.hold_state)
            };
            if current == goal {
                return None;
            }
            if !attacking && !forward_path_exists(&weapon.common, current, goal) {
                return None;
            }
            let cost = weapon.common.state(current)?.ticks;
            Some(Step::Advance { mode, cost })
        }
    }
}

/// Step-5 entry point: schedule (or inline-apply) the unit's next weapon
/// state transition if none is already pending.
pub(crate) fn progress(gs: &mut GameState, id: UnitId, hooks: &mut dyn CombatHooks) {
    for _ in 0..MAX_CHAIN {
        let Some(step) = next_step(gs, id) else {
            return;
        };
        let mode = gs
            .units
            .get(id)
            .map(|u| u.character.effective_mode())
            .unwrap_or_default();
        if gs.queue.has_pending_advance(id, mode) {
            return;
        }
        match step {
            Step::EnterReload { cost } => {
                enter_reload(gs, id);
                let tick = gs.current_tick();
                gs.queue.schedule(tick + u64::from(cost), id, EventKind::StateAdvance { mode });
                return;
            }
            Step::Advance { mode, cost } => {
                if cost == 0 {
                    advance_one(gs, id, mode, hooks);
                    // Loop: the new state may chain further.
                } else {
                    let tick = gs.current_tick();
                    gs.queue
                        .schedule(tick + u64::from(cost), id, EventKind::StateAdvance { mode });
                    return;
                }
            }
        }
    }
    tracing::warn!(unit = id, "weapon state chain exceeded limit; possible zero-cost cycle");
}

/// Handle a fired `StateAdvance` event.
pub(crate) fn execute_advance(
    gs: &mut GameState,
    owner: UnitId,
    mode: CombatMode,
    hooks: &mut dyn CombatHooks,
) {
    let Some(unit) = gs.units.get(owner) else {
        return;
    };
    if unit.character.incapacitated || unit.character.effective_mode() != mode {
        return;
    }
    advance_one(gs, owner, mode, hooks);
    progress(gs, owner, hooks);
}

/// Put the ranged weapon into its reload state.
fn enter_reload(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    let Some(carried) = unit.character.ranged.as_mut() else {
        return;
    };
    let weapon_id = carried.weapon.clone();
    if let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&weapon_id) {
        let reload = weapon.reload_state.clone();
        if let Some(carried) = gs
            .units
            .get_mut(id)
            .and_then(|u| u.character.ranged.as_mut())
        {
            carried.state = reload;
        }
    }
}

/// Advance the weapon exactly one state and apply entry side effects.
fn advance_one(gs: &mut GameState, id: UnitId, mode: CombatMode, hooks: &mut dyn CombatHooks) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let character = &unit.character;

    let (weapon_id, current) = match mode {
        CombatMode::Ranged => match character.ranged.as_ref() {
            Some(c) => (c.weapon.clone(), c.state.clone()),
            None => return,
        },
        CombatMode::Melee => (character.melee.weapon.clone(), character.melee.state.clone()),
    };
    let Some(weapon) = gs.weapons.get(&weapon_id) else {
        return;
    };
    let Some(def) = weapon.common().state(&current) else {
        tracing::warn!(unit = id, state = %current, "weapon in undeclared state; resetting");
        let default = weapon.default_state().to_string();
        set_state(gs, id, mode, default);
        return;
    };
    let next = def.next.clone();

    let leaving_reload = matches!(weapon, Weapon::Ranged(w) if current == w.reload_state);
    let was_recovering = current == STATE_RECOVERING;

    set_state(gs, id, mode, next.clone());

    if leaving_reload {
        if let Some(carried) = gs
            .units
            .get_mut(id)
            .and_then(|u| u.character.ranged.as_mut())
        {
            let capacity = match gs.weapons.get(&weapon_id) {
                Some(Weapon::Ranged(w)) => w.ammo_capacity,
                _ => carried.ammo,
            };
            carried.ammo = capacity;
            carried.burst_fired = 0;
        }
    }

    match (mode, next.as_str()) {
        (CombatMode::Ranged, STATE_FIRING) => fire_shot(gs, id, hooks),
        (CombatMode::Ranged, STATE_AIMING) if was_recovering => complete_ranged_cycle(gs, id),
        (CombatMode::Melee, STATE_MELEE_ATTACKING) => begin_swing(gs, id, hooks),
        _ => {}
    }
}

fn set_state(gs: &mut GameState, id: UnitId, mode: CombatMode, state: String) {
    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    match mode {
        CombatMode::Ranged => {
            if let Some(carried) = unit.character.ranged.as_mut() {
                carried.state = state;
            }
        }
        CombatMode::Melee => unit.character.melee.state = state,
    }
}

/// The weapon just entered "firing": discharge one round.
fn fire_shot(gs: &mut GameState, id: UnitId, hooks: &mut dyn CombatHooks) {
    if !target_alive(gs, id) {
        abort_cycle(gs, id);
        return;
    }
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let target = unit.character.target.expect("checked by target_alive");
    let Some(carried) = unit.character.ranged.as_ref() else {
        return;
    };
    if carried.ammo == 0 {
        abort_cycle(gs, id);
        return;
    }
    let weapon_id = carried.weapon.clone();
    let burst_index = carried.burst_fired;
    let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&weapon_id) else {
        return;
    };
    let firing_delay = weapon.firing_delay;
    let weapon_name = weapon.common.name.clone();

    hooks.play_weapon_sound(&weapon_name);
    hooks.add_muzzle_flash(id, MUZZLE_FLASH_TICKS);

    let attack_roll = gs.rng.percentile();
    let location_roll = gs.rng.percentile();

    if let Some(unit) = gs.units.get_mut(id) {
        if let Some(carried) = unit.character.ranged.as_mut() {
            carried.ammo -= 1;
            carried.burst_fired += 1;
        }
        unit.character.ranged_tally.attempted += 1;
    }

    let tick = gs.current_tick();
    gs.queue.schedule(
        tick + u64::from(firing_delay),
        id,
        EventKind::RangedImpact {
            target,
            attack_roll,
            location_roll,
            burst_index,
        },
    );
}

/// The weapon just entered "melee_attacking": start the swing.
fn begin_swing(gs: &mut GameState, id: UnitId, hooks: &mut dyn CombatHooks) {
    if !target_alive(gs, id) {
        abort_cycle(gs, id);
        return;
    }
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let target = unit.character.target.expect("checked by target_alive");
    let weapon_id = unit.character.melee.weapon.clone();
    let Some(Weapon::Melee(weapon)) = gs.weapons.get(&weapon_id) else {
        return;
    };
    let attack_speed = weapon.attack_speed;
    let weapon_name = weapon.common.name.clone();

    hooks.play_weapon_sound(&weapon_name);

    let attack_roll = gs.rng.percentile();
    let location_roll = gs.rng.percentile();

    if let Some(unit) = gs.units.get_mut(id) {
        unit.character.melee_tally.attempted += 1;
    }

    let tick = gs.current_tick();
    gs.queue.schedule(
        tick + u64::from(attack_speed),
        id,
        EventKind::MeleeImpact {
            target,
            attack_roll,
            location_roll,
            counter: false,
        },
    );
}

/// The ranged weapon settled back into aiming after a shot: either
/// continue the burst or declare the attack cycle complete.
fn complete_ranged_cycle(gs: &mut GameState, id: UnitId) {
    let alive = target_alive(gs, id);
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let Some(carried) = unit.character.ranged.as_ref() else {
        return;
    };
    let continue_burst = unit.character.is_attacking
        && alive
        && carried.ammo > 0
        && match carried.firing_mode {
            FiringMode::Single => false,
            FiringMode::Burst => {
                let burst_size = match gs.weapons.get(&carried.weapon) {
                    Some(Weapon::Ranged(w)) => w.burst_size,
                    _ => 0,
                };
                carried.burst_fired < burst_size
            }
            FiringMode::FullAuto => true,
        };
    if !continue_burst {
        if let Some(unit) = gs.units.get_mut(id) {
            let character = &mut unit.character;
            if let Some(carried) = character.ranged.as_mut() {
                carried.burst_fired = 0;
            }
            character.is_attacking = false;
            character.attack_cycle_done = true;
        }
    }
}

/// Abandon the current attack cycle (target gone, magazine empty).
fn abort_cycle(gs: &mut GameState, id: UnitId) {
    if let Some(unit) = gs.units.get_mut(id) {
        let character = &mut unit.character;
        character.is_attacking = false;
        character.attack_cycle_done = true;
        if let Some(carried) = character.ranged.as_mut() {
            carried.burst_fired = 0;
        }
    }
}

/// Reset both carried weapons to their weapon-specific default states.
///
/// Used on combat-mode changes and on load.
pub(crate) fn reset_weapon_states(gs: &mut GameState, id: UnitId) {
    let Some(unit) = gs.units.get(id) else {
        return;
    };
    let ranged_default = unit
        .character
        .ranged
        .as_ref()
        .and_then(|c| gs.weapons.get(&c.weapon))
        .map(|w| w.default_state().to_string());
    let melee_default = gs
        .weapons
        .get(&unit.character.melee.weapon)
        .map(|w| w.default_state().to_string());

    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    if let (Some(carried), Some(default)) = (unit.character.ranged.as_mut(), ranged_default) {
        carried.state = default;
        carried.burst_fired = 0;
    }
    if let Some(default) = melee_default {
        unit.character.melee.state = default;
    }
}
