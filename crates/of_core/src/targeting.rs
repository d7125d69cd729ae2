//! Auto-targeting, target zones, and re-engagement.
//!
//! The evaluator runs for auto-targeting units whose target has become
//! invalid, whose attack cycle just completed, or whose auto-targeting
//! was just switched on. It never runs while an attack is mid-cycle:
//! the current attack always completes first.

use crate::attack::{self, mid_attack_cycle};
use crate::character::CombatMode;
use crate::events::EventFilter;
use crate::game_state::GameState;
use crate::math::pixels_to_feet;
use crate::units::UnitId;
use crate::weapons::Weapon;

/// Whether `target_id` is a valid combat target for `id` in its current
/// mode: hostile, conscious, and (for ranged) inside maximum range.
pub(crate) fn target_valid(gs: &GameState, id: UnitId, target_id: UnitId) -> bool {
    let Some(unit) = gs.units.get(id) else {
        return false;
    };
    let Some(target) = gs.units.get(target_id) else {
        return false;
    };
    if target.character.incapacitated || id == target_id {
        return false;
    }
    if !gs
        .alignment
        .hostile(unit.character.faction, target.character.faction)
    {
        return false;
    }
    match unit.character.effective_mode() {
        CombatMode::Melee => true,
        CombatMode::Ranged => {
            let Some(carried) = unit.character.ranged.as_ref() else {
                return false;
            };
            let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&carried.weapon) else {
                return false;
            };
            pixels_to_feet(unit.position.distance(target.position)) <= weapon.max_range_feet
        }
    }
}

/// Pick a target for `id`, honoring the target zone as a preference
/// (or a hard filter in strict-zone configurations).
///
/// Selection: zone candidates if any (else the global pool), then the
/// nearest by Euclidean distance, with exact ties broken by the seeded
/// RNG so replays stay deterministic.
pub(crate) fn select_target(gs: &mut GameState, id: UnitId) -> Option<UnitId> {
    let candidates: Vec<UnitId> = gs
        .units
        .sorted_ids()
        .into_iter()
        .filter(|&other| other != id && target_valid(gs, id, other))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let unit = gs.units.get(id)?;
    let zone = unit.character.target_zone;
    let position = unit.position;

    let pool: Vec<UnitId> = match zone {
        Some(zone) => {
            let in_zone: Vec<UnitId> = candidates
                .iter()
                .copied()
                .filter(|&c| {
                    gs.units
                        .get(c)
                        .is_some_and(|t| zone.contains(t.position))
                })
                .collect();
            if !in_zone.is_empty() {
                in_zone
            } else if gs.config.strict_zones {
                return None;
            } else {
                candidates
            }
        }
        None => candidates,
    };

    let mut best = f64::INFINITY;
    for &c in &pool {
        if let Some(t) = gs.units.get(c) {
            best = best.min(position.distance(t.position));
        }
    }
    let nearest: Vec<UnitId> = pool
        .into_iter()
        .filter(|&c| {
            gs.units
                .get(c)
                .is_some_and(|t| position.distance(t.position) == best)
        })
        .collect();

    match nearest.len() {
        0 => None,
        1 => Some(nearest[0]),
        n => Some(nearest[gs.rng.pick(n)]),
    }
}

/// Run the evaluator for `id` and engage whatever it selects.
///
/// On a target change, events aimed at the previous target are
/// cancelled and accumulated aiming time resets. In melee the pursuit
/// logic will close the distance; the attack intent is set here either
/// way, with hesitation gating the actual swing.
pub(crate) fn evaluate_and_engage(gs: &mut GameState, id: UnitId) {
    let previous = gs.units.get(id).and_then(|u| u.character.target);
    let selection = select_target(gs, id);

    match selection {
        Some(new_target) => {
            if previous != Some(new_target) {
                if let Some(old) = previous {
                    gs.queue.cancel_owned(id, EventFilter::AttacksAgainst(old));
                }
            }
            if let Some(unit) = gs.units.get_mut(id) {
                unit.character.set_target(Some(new_target));
                unit.character.is_attacking = true;
            }
        }
        None => {
            if let Some(unit) = gs.units.get_mut(id) {
                unit.character.set_target(None);
                unit.character.is_attacking = false;
            }
        }
    }
}

/// Step-4 pass for one unit: completed-cycle follow-up and the
/// auto-targeting evaluator triggers.
pub(crate) fn update_targeting(gs: &mut GameState, id: UnitId) {
    // Consume the cycle-completion flag regardless of what happens next.
    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    let cycle_done = std::mem::take(&mut unit.character.attack_cycle_done);
    let character = &unit.character;
    if character.incapacitated {
        return;
    }
    let auto = character.auto_target;
    let persistent = character.persistent_attack;
    let current = character.target;

    if !auto {
        // Manual attacker: persistent attack re-engages the same target
        // after each completed cycle; otherwise the unit stands down.
        if cycle_done && persistent {
            if let Some(target) = current {
                if target_valid(gs, id, target) {
                    let _ = attack::initiate_attack(gs, id, target);
                }
            }
        }
        return;
    }

    if mid_attack_cycle(gs, id) {
        return;
    }
    let target_ok = current.is_some_and(|t| target_valid(gs, id, t));
    if target_ok && !cycle_done {
        return;
    }
    evaluate_and_engage(gs, id);
}
