//! Attack initiation and impact resolution.
//!
//! Hit chance is computed at the moment of impact from the attacker's
//! and target's state at that tick; the rolls themselves were drawn when
//! the shot or swing was scheduled, keeping the RNG stream independent
//! of how events interleave in the queue.

use crate::character::{AimingSpeed, CombatMode};
use crate::defense;
use crate::error::{CoreError, Result};
use crate::events::EventFilter;
use crate::game_state::{GameState, TickEvents};
use crate::math::{feet_to_pixels, pixels_to_feet};
use crate::state_machine::{STATE_FIRING, STATE_MELEE_ATTACKING, STATE_RECOVERING};
use crate::stats::{skill_level, stat_modifier, SKILL_BONUS_PER_LEVEL};
use crate::units::UnitId;
use crate::weapons::{FiringMode, Weapon};
use crate::wounds::{wound_attack_penalty, BodyLocation, WoundSeverity};

/// Base hit chance before modifiers.
pub const BASE_HIT_CHANCE: i32 = 50;

/// Hit-chance penalty at a ranged weapon's maximum range.
pub const MAX_RANGE_PENALTY: i32 = -40;

/// Extra severity multiplier for a critical hit to the chest.
const CHEST_CRITICAL_MULTIPLIER: f64 = 3.0;

/// Radius in feet within which a unit falling rattles nearby hostiles.
const BRAVERY_CHECK_RADIUS_FEET: f64 = 30.0;

/// How one attack resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactOutcome {
    /// The attack wounded the target.
    Hit {
        /// Where it landed.
        location: BodyLocation,
        /// How bad it was.
        severity: WoundSeverity,
        /// Damage applied.
        damage: i32,
    },
    /// The roll failed.
    Miss,
    /// The target's defensive roll negated the attack.
    Defended,
    /// The target was beyond weapon range or melee reach at impact.
    OutOfRange,
}

/// One resolved impact, reported through [`TickEvents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactRecord {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Target unit.
    pub target: UnitId,
    /// What happened.
    pub outcome: ImpactOutcome,
}

/// Whether the unit is in the middle of an attack cycle.
///
/// The auto-targeting evaluator never runs mid-cycle: the current attack
/// always completes first.
pub(crate) fn mid_attack_cycle(gs: &GameState, id: UnitId) -> bool {
    if gs.queue.has_pending(id, EventFilter::Attacks) {
        return true;
    }
    let Some(unit) = gs.units.get(id) else {
        return false;
    };
    let character = &unit.character;
    match character.effective_mode() {
        CombatMode::Ranged => {
            let state = character.active_weapon_state();
            state == STATE_FIRING || state == STATE_RECOVERING
        }
        CombatMode::Melee => {
            character.melee.state == STATE_MELEE_ATTACKING
                || (character.is_attacking && !character.can_melee_attack(gs.current_tick()))
        }
    }
}

/// Begin an attack cycle against `target`.
///
/// Sets the target and attack intent; the weapon state machine carries
/// the attack forward from there. Rejections (self, non-hostile,
/// incapacitated target, melee recovery) leave state untouched.
pub(crate) fn initiate_attack(gs: &mut GameState, attacker: UnitId, target: UnitId) -> Result<()> {
    if attacker == target {
        return Err(CoreError::InvalidCommand(
            "a unit cannot target itself".to_string(),
        ));
    }
    let attacker_unit = gs
        .units
        .get(attacker)
        .ok_or(CoreError::UnitNotFound(attacker))?;
    let target_unit = gs.units.get(target).ok_or(CoreError::UnitNotFound(target))?;

    if !gs
        .alignment
        .hostile(attacker_unit.character.faction, target_unit.character.faction)
    {
        return Err(CoreError::InvalidCommand(format!(
            "{} is not hostile to {}",
            attacker_unit.character.name, target_unit.character.name
        )));
    }
    if target_unit.character.incapacitated {
        return Err(CoreError::InvalidCommand(format!(
            "{} is already out of the fight",
            target_unit.character.name
        )));
    }

    let mode = attacker_unit.character.effective_mode();
    if mode == CombatMode::Melee && !attacker_unit.character.can_melee_attack(gs.current_tick()) {
        return Err(CoreError::InvalidCommand(format!(
            "ATTACK BLOCKED: {} is still recovering",
            attacker_unit.character.name
        )));
    }
    if mid_attack_cycle(gs, attacker) {
        // The in-flight attack completes first; the new intent would be
        // picked up by the next cycle anyway.
        tracing::debug!(attacker, target, "attack already in progress; command absorbed");
        return Ok(());
    }

    if let Some(unit) = gs.units.get_mut(attacker) {
        unit.character.set_target(Some(target));
        unit.character.is_attacking = true;
        // Manual targeting overrides any zone preference for good.
        unit.character.target_zone = None;
        if mode == CombatMode::Melee {
            // Consume a spent recovery marker so the completion pass
            // cannot cancel an attack legally issued at the boundary.
            unit.character.melee_recovery_end = 0;
        }
    }
    Ok(())
}

/// Ranged hit chance at impact, clamped to [1, 99].
///
/// Returns `None` when the target lies beyond the weapon's maximum
/// range, which is an automatic miss.
#[must_use]
pub fn ranged_hit_chance(
    gs: &GameState,
    attacker: UnitId,
    target: UnitId,
    burst_index: u8,
) -> Option<i32> {
    let attacker_unit = gs.units.get(attacker)?;
    let target_unit = gs.units.get(target)?;
    let character = &attacker_unit.character;
    let carried = character.ranged.as_ref()?;
    let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&carried.weapon) else {
        return None;
    };

    let distance_feet = pixels_to_feet(attacker_unit.position.distance(target_unit.position));
    if distance_feet > weapon.max_range_feet {
        return None;
    }

    let mut chance = BASE_HIT_CHANCE;
    chance += stat_modifier(character.stats.dexterity);
    chance += weapon.common.accuracy;
    if let Some(skill) = &weapon.common.combat_skill {
        chance +=
            SKILL_BONUS_PER_LEVEL * i32::from(skill_level(&character.skills, skill));
    }

    // Aiming modifier; follow-up shots of a burst degrade to snap fire.
    let effective_speed = match carried.firing_mode {
        FiringMode::FullAuto if burst_index > 0 => AimingSpeed::Quick,
        _ => character.aiming_speed,
    };
    chance += effective_speed.hit_modifier(character.aiming_ticks);
    if carried.firing_mode == FiringMode::Burst && burst_index > 0 {
        chance += AimingSpeed::Quick.hit_modifier(0);
    }

    // Linear range taper: 0 at point blank, MAX_RANGE_PENALTY at max range.
    chance += (f64::from(MAX_RANGE_PENALTY) * distance_feet / weapon.max_range_feet).round() as i32;

    if attacker_unit.is_moving() {
        chance -= character.effective_movement().firing_penalty();
    }
    if target_unit.is_moving() {
        chance -= target_unit.character.effective_movement().firing_penalty();
    }

    chance += wound_attack_penalty(&character.wounds);

    Some(chance.clamp(1, 99))
}

/// Melee hit chance at impact, clamped to [1, 99].
#[must_use]
pub fn melee_hit_chance(gs: &GameState, attacker: UnitId) -> Option<i32> {
    let attacker_unit = gs.units.get(attacker)?;
    let character = &attacker_unit.character;
    let Some(Weapon::Melee(weapon)) = gs.weapons.get(&character.melee.weapon) else {
        return None;
    };

    let mut chance = BASE_HIT_CHANCE;
    chance += stat_modifier(character.stats.dexterity);
    chance += weapon.common.accuracy;
    if let Some(skill) = &weapon.common.combat_skill {
        chance +=
            SKILL_BONUS_PER_LEVEL * i32::from(skill_level(&character.skills, skill));
    }
    chance += wound_attack_penalty(&character.wounds);

    Some(chance.clamp(1, 99))
}

/// Damage after the severity multiplier. Non-scratch wounds always deal
/// at least 1; a scratch may graze for nothing.
#[must_use]
pub fn scaled_damage(base: i32, severity: WoundSeverity, location: BodyLocation) -> i32 {
    let multiplier = if severity == WoundSeverity::Critical && location == BodyLocation::Chest {
        CHEST_CRITICAL_MULTIPLIER
    } else {
        severity.damage_multiplier()
    };
    let scaled = (f64::from(base) * multiplier).round() as i32;
    if severity == WoundSeverity::Scratch {
        scaled.max(0)
    } else {
        scaled.max(1)
    }
}

/// Resolve an in-flight ranged shot arriving this tick.
pub(crate) fn resolve_ranged_impact(
    gs: &mut GameState,
    attacker: UnitId,
    target: UnitId,
    attack_roll: u8,
    location_roll: u8,
    burst_index: u8,
    out: &mut TickEvents,
) {
    let Some(attacker_unit) = gs.units.get(attacker) else {
        return;
    };
    let Some(carried) = attacker_unit.character.ranged.as_ref() else {
        return;
    };
    let Some(Weapon::Ranged(weapon)) = gs.weapons.get(&carried.weapon) else {
        return;
    };
    let weapon_name = weapon.common.name.clone();
    let noun = weapon.common.wound_noun.clone();
    let base_damage = weapon.common.damage;

    let Some(target_unit) = gs.units.get(target) else {
        out.messages
            .push(format!("{weapon_name} fires; the {noun} finds nothing"));
        return;
    };
    let target_name = target_unit.character.name.clone();

    if target_unit.character.incapacitated {
        out.messages
            .push(format!("{weapon_name} fires; the {noun} misses {target_name}"));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Miss,
        });
        return;
    }

    let Some(chance) = ranged_hit_chance(gs, attacker, target, burst_index) else {
        out.messages.push(format!(
            "{weapon_name} fires; the {noun} falls short of {target_name}"
        ));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::OutOfRange,
        });
        return;
    };

    if i32::from(attack_roll) <= chance {
        let margin = chance - i32::from(attack_roll);
        let severity = WoundSeverity::from_margin(margin);
        let location = BodyLocation::from_roll(location_roll);
        let damage = scaled_damage(base_damage, severity, location);

        if let Some(unit) = gs.units.get_mut(attacker) {
            unit.character.ranged_tally.successful += 1;
        }
        out.messages.push(format!(
            "{weapon_name} fires; {noun} hits {target_name} in the {location} causing a {severity} wound"
        ));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Hit {
                location,
                severity,
                damage,
            },
        });
        apply_wound(
            gs,
            attacker,
            target,
            CombatMode::Ranged,
            location,
            severity,
            damage,
            &noun,
            out,
        );
    } else {
        out.messages
            .push(format!("{weapon_name} fires; the {noun} misses {target_name}"));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Miss,
        });
    }
}

/// Resolve a melee swing landing this tick.
///
/// Reach is re-checked at impact: a target that stepped away makes the
/// swing miss, and the cooldown is paid either way.
pub(crate) fn resolve_melee_impact(
    gs: &mut GameState,
    attacker: UnitId,
    target: UnitId,
    attack_roll: u8,
    location_roll: u8,
    counter: bool,
    out: &mut TickEvents,
) {
    let Some(attacker_unit) = gs.units.get(attacker) else {
        return;
    };
    let weapon_id = attacker_unit.character.melee.weapon.clone();
    let Some(Weapon::Melee(weapon)) = gs.weapons.get(&weapon_id) else {
        return;
    };
    let weapon_name = weapon.common.name.clone();
    let noun = weapon.common.wound_noun.clone();
    let base_damage = weapon.common.damage;
    let reach_pixels = feet_to_pixels(weapon.reach_feet);
    let cooldown = weapon.attack_cooldown;
    let strength = attacker_unit.character.stats.strength;

    // Recovery starts at impact, hit or miss.
    let tick = gs.current_tick();
    if let Some(unit) = gs.units.get_mut(attacker) {
        unit.character.melee_recovery_end = tick + u64::from(cooldown);
    }

    let Some(target_unit) = gs.units.get(target) else {
        return;
    };
    let target_name = target_unit.character.name.clone();

    if target_unit.character.incapacitated {
        out.messages
            .push(format!("{weapon_name} misses {target_name}"));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Miss,
        });
        return;
    }

    let attacker_unit = gs.units.get(attacker).expect("checked above");
    let in_reach = attacker_unit.position.distance(target_unit.position)
        <= attacker_unit.radius + target_unit.radius + reach_pixels;
    if !in_reach {
        out.messages.push(format!(
            "{weapon_name} swings at {target_name} and misses (out of reach)"
        ));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::OutOfRange,
        });
        return;
    }

    if !counter && defense::attempt_defense(gs, attacker, target, out) {
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Defended,
        });
        return;
    }

    let chance = melee_hit_chance(gs, attacker).unwrap_or(BASE_HIT_CHANCE);
    if i32::from(attack_roll) <= chance {
        let margin = chance - i32::from(attack_roll);
        let severity = WoundSeverity::from_margin(margin);
        let location = BodyLocation::from_roll(location_roll);
        let damage = scaled_damage(base_damage + stat_modifier(strength), severity, location);

        if let Some(unit) = gs.units.get_mut(attacker) {
            unit.character.melee_tally.successful += 1;
        }
        out.messages.push(format!(
            "{weapon_name} strikes {target_name} in the {location} causing a {severity} wound"
        ));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Hit {
                location,
                severity,
                damage,
            },
        });
        apply_wound(
            gs,
            attacker,
            target,
            CombatMode::Melee,
            location,
            severity,
            damage,
            &noun,
            out,
        );
    } else {
        out.messages
            .push(format!("{weapon_name} misses {target_name}"));
        out.impacts.push(ImpactRecord {
            attacker,
            target,
            outcome: ImpactOutcome::Miss,
        });
    }
}

/// Apply a wound to the target: record it, subtract health, and handle
/// hesitation or incapacitation fallout.
#[allow(clippy::too_many_arguments)]
fn apply_wound(
    gs: &mut GameState,
    attacker: UnitId,
    target: UnitId,
    mode: CombatMode,
    location: BodyLocation,
    severity: WoundSeverity,
    damage: i32,
    noun: &str,
    out: &mut TickEvents,
) {
    let tick = gs.current_tick();

    if let Some(unit) = gs.units.get_mut(attacker) {
        unit.character.tally_mut(mode).wounds_inflicted += 1;
    }

    let Some(unit) = gs.units.get_mut(target) else {
        return;
    };
    let character = &mut unit.character;
    character.wounds.push(crate::wounds::Wound {
        location,
        severity,
        damage,
        noun: noun.to_string(),
        tick,
    });
    character.health = (character.health - damage).max(0);

    let incapacitating =
        character.health == 0 || (severity == WoundSeverity::Critical && location.is_vital());

    if incapacitating && !character.incapacitated {
        character.incapacitated = true;
        character.is_attacking = false;
        character.attack_cycle_done = false;
        unit.destination = None;
        let fallen_name = unit.character.name.clone();
        let fallen_position = unit.position;
        let fallen_faction = unit.character.faction;

        gs.queue.cancel_owned(target, EventFilter::Any);
        out.messages.push(format!("{fallen_name} falls"));
        out.incapacitations.push(target);

        run_bravery_checks(gs, target, fallen_position, fallen_faction, out);
    } else if severity != WoundSeverity::Scratch {
        character.wound_hesitation = character.wound_hesitation.max(severity.hesitation_ticks());
    }
}

/// A hostile just fell: every enemy of the fallen within 30 feet rolls
/// coolness or hesitates.
fn run_bravery_checks(
    gs: &mut GameState,
    fallen: UnitId,
    fallen_position: crate::math::Vec2,
    fallen_faction: crate::factions::FactionId,
    out: &mut TickEvents,
) {
    let radius = feet_to_pixels(BRAVERY_CHECK_RADIUS_FEET);
    for id in gs.units.sorted_ids() {
        if id == fallen {
            continue;
        }
        let Some(observer) = gs.units.get(id) else {
            continue;
        };
        if observer.character.incapacitated {
            continue;
        }
        if !gs.alignment.hostile(observer.character.faction, fallen_faction) {
            continue;
        }
        if observer.position.distance(fallen_position) > radius {
            continue;
        }

        let chance = (BASE_HIT_CHANCE + stat_modifier(observer.character.stats.coolness))
            .clamp(1, 99);
        let roll = gs.rng.percentile();
        if i32::from(roll) > chance {
            if let Some(observer) = gs.units.get_mut(id) {
                observer.character.bravery_hesitation = observer
                    .character
                    .bravery_hesitation
                    .max(defense::BRAVERY_HESITATION_TICKS);
                let name = observer.character.name.clone();
                out.messages.push(format!("{name} hesitates"));
            }
        }
    }
}
