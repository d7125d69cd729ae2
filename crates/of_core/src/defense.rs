//! Melee defense, cooldown bookkeeping, and per-tick timers.

use crate::character::{CombatMode, DefenseState};
use crate::events::EventKind;
use crate::game_state::{GameState, TickEvents};
use crate::state_machine::{STATE_AIMING, STATE_MELEE_READY};
use crate::stats::{skill_level, stat_modifier, SKILL_BONUS_PER_LEVEL};
use crate::units::UnitId;
use crate::weapons::Weapon;

/// Base defense chance before modifiers.
const BASE_DEFENSE_CHANCE: i32 = 50;

/// Ticks of bravery hesitation on a failed coolness check.
pub const BRAVERY_HESITATION_TICKS: u32 = 60;

/// Attempt a defensive roll against an incoming melee impact.
///
/// Only a ready, non-attacking, conscious defender may try. The defense
/// cooldown is spent whether or not the roll succeeds, and while it
/// runs, further impacts bypass defense entirely. Returns true when the
/// attack was negated.
pub(crate) fn attempt_defense(
    gs: &mut GameState,
    attacker: UnitId,
    target: UnitId,
    out: &mut TickEvents,
) -> bool {
    let Some(target_unit) = gs.units.get(target) else {
        return false;
    };
    let character = &target_unit.character;
    if character.incapacitated
        || character.is_attacking
        || character.defense_state != DefenseState::Ready
    {
        return false;
    }

    let Some(Weapon::Melee(weapon)) = gs.weapons.get(&character.melee.weapon) else {
        return false;
    };
    let mut chance = BASE_DEFENSE_CHANCE + stat_modifier(character.stats.dexterity);
    if let Some(skill) = &weapon.common.combat_skill {
        chance += SKILL_BONUS_PER_LEVEL * i32::from(skill_level(&character.skills, skill));
    }
    chance += weapon.defend_score / 2;
    let chance = chance.clamp(1, 99);

    let cooldown = weapon.defense_cooldown;
    let target_name = character.name.clone();

    let roll = gs.rng.percentile();
    let tick = gs.current_tick();
    if let Some(unit) = gs.units.get_mut(target) {
        unit.character.defense_state = DefenseState::Cooldown;
        unit.character.defense_cooldown_end = tick + u64::from(cooldown);
    }

    let defended = i32::from(roll) <= chance;
    if defended {
        let attacker_name = gs
            .units
            .get(attacker)
            .map_or_else(String::new, |u| u.character.name.clone());
        out.messages
            .push(format!("{target_name} defends against {attacker_name}"));
        if gs.config.counter_attacks {
            try_counter_attack(gs, target, attacker);
        }
    }
    defended
}

/// After a successful defense, the defender may riposte at half attack
/// speed if its weapon is readied. The counter swing itself cannot be
/// defended; the original attacker just spent its chance.
fn try_counter_attack(gs: &mut GameState, defender: UnitId, attacker: UnitId) {
    let tick = gs.current_tick();
    let Some(unit) = gs.units.get(defender) else {
        return;
    };
    let character = &unit.character;
    if character.hesitating()
        || !character.can_melee_attack(tick)
        || character.melee.state != STATE_MELEE_READY
    {
        return;
    }
    let Some(Weapon::Melee(weapon)) = gs.weapons.get(&character.melee.weapon) else {
        return;
    };
    let delay = (weapon.attack_speed / 2).max(1);

    let attack_roll = gs.rng.percentile();
    let location_roll = gs.rng.percentile();
    if let Some(unit) = gs.units.get_mut(defender) {
        unit.character.set_target(Some(attacker));
        unit.character.is_attacking = true;
        unit.character.melee_tally.attempted += 1;
    }
    gs.queue.schedule(
        tick + u64::from(delay),
        defender,
        EventKind::MeleeImpact {
            target: attacker,
            attack_roll,
            location_roll,
            counter: true,
        },
    );
}

/// Step-3 timer pass for one unit: hesitation countdowns, defense
/// cooldown expiry, melee recovery completion, and aiming-time accrual.
pub(crate) fn update_timers(gs: &mut GameState, id: UnitId) {
    let tick = gs.current_tick();
    let Some(unit) = gs.units.get_mut(id) else {
        return;
    };
    let character = &mut unit.character;
    if character.incapacitated {
        return;
    }

    let was_hesitating = character.hesitating();
    if character.wound_hesitation > 0 {
        character.wound_hesitation -= 1;
    }
    if character.bravery_hesitation > 0 {
        character.bravery_hesitation -= 1;
    }
    // A hesitation ending is a re-engagement trigger for auto-targeting:
    // the deferred attack should resume without a fresh command.
    if was_hesitating
        && !character.hesitating()
        && character.auto_target
        && character.target.is_some()
    {
        character.attack_cycle_done = true;
    }

    if character.defense_state == DefenseState::Cooldown && tick >= character.defense_cooldown_end
    {
        character.defense_state = DefenseState::Ready;
    }

    // Melee recovery completion. The end tick doubles as a one-shot
    // marker: it is consumed here (and by a fresh attack command issued
    // right at the boundary) so a cycle completes exactly once.
    if character.is_attacking
        && character.effective_mode() == CombatMode::Melee
        && character.melee_recovery_end != 0
        && tick >= character.melee_recovery_end
    {
        character.melee_recovery_end = 0;
        character.is_attacking = false;
        character.attack_cycle_done = true;
    }

    if character.effective_mode() == CombatMode::Ranged
        && character.target.is_some()
        && character
            .ranged
            .as_ref()
            .is_some_and(|c| c.state == STATE_AIMING)
    {
        character.aiming_ticks += 1;
    }
}
