//! Standard weapons and archetypes shared by tests and benches.

use of_core::prelude::*;
use of_core::weapons::{WeaponCommon, WeaponStateDef};

fn state(name: &str, next: &str, ticks: u32) -> WeaponStateDef {
    WeaponStateDef {
        name: name.to_string(),
        next: next.to_string(),
        ticks,
    }
}

/// Single-action revolver used by the gunslinger archetype.
#[must_use]
pub fn colt_peacemaker() -> Weapon {
    Weapon::Ranged(RangedWeapon {
        common: WeaponCommon {
            id: "colt_peacemaker".to_string(),
            name: "Colt Peacemaker".to_string(),
            damage: 6,
            wound_noun: "bullet".to_string(),
            length_feet: 1.0,
            kind: "revolver".to_string(),
            accuracy: 15,
            states: vec![
                state("holstered", "grippinginholster", 15),
                state("grippinginholster", "drawing", 15),
                state("drawing", "ready", 30),
                state("ready", "aiming", 30),
                state("aiming", "firing", 15),
                state("firing", "recovering", 5),
                state("recovering", "aiming", 30),
                state("reloading", "ready", 120),
            ],
            initial_state: "holstered".to_string(),
            combat_skill: Some("pistol".to_string()),
        },
        max_range_feet: 210.0,
        velocity_fps: 900.0,
        ammo_capacity: 6,
        reload_state: "reloading".to_string(),
        reload_ticks: 120,
        firing_delay: 8,
        modes: vec![FiringMode::Single],
        burst_size: 3,
    })
}

/// Short blade with a quick swing and matching cooldown.
#[must_use]
pub fn steel_dagger() -> Weapon {
    Weapon::Melee(MeleeWeapon {
        common: WeaponCommon {
            id: "steel_dagger".to_string(),
            name: "Steel Dagger".to_string(),
            damage: 6,
            wound_noun: "blade".to_string(),
            length_feet: 1.0,
            kind: "dagger".to_string(),
            accuracy: 5,
            states: vec![
                state("sheathed", "unsheathing", 30),
                state("unsheathing", "melee_ready", 30),
                state("melee_ready", "melee_attacking", 0),
                state("melee_attacking", "melee_ready", 60),
            ],
            initial_state: "sheathed".to_string(),
            combat_skill: Some("blade".to_string()),
        },
        subtype: MeleeSubtype::Short,
        reach_feet: 1.5,
        attack_speed: 60,
        attack_cooldown: 60,
        defend_score: 40,
        defense_cooldown: 60,
        readying_ticks: 60,
        one_handed: true,
        from_ranged: false,
    })
}

/// The melee weapon nobody is ever without.
#[must_use]
pub fn unarmed() -> Weapon {
    Weapon::Melee(MeleeWeapon {
        common: WeaponCommon {
            id: "unarmed".to_string(),
            name: "Unarmed".to_string(),
            damage: 2,
            wound_noun: "blow".to_string(),
            length_feet: 0.0,
            kind: "unarmed".to_string(),
            accuracy: 0,
            states: vec![
                state("melee_ready", "melee_attacking", 0),
                state("melee_attacking", "melee_ready", 30),
            ],
            initial_state: "melee_ready".to_string(),
            combat_skill: Some("brawling".to_string()),
        },
        subtype: MeleeSubtype::Unarmed,
        reach_feet: 0.5,
        attack_speed: 30,
        attack_cooldown: 45,
        defend_score: 20,
        defense_cooldown: 60,
        readying_ticks: 0,
        one_handed: true,
        from_ranged: false,
    })
}

/// Empty game state with the standard weapon set registered.
#[must_use]
pub fn armed_state(seed: u64) -> GameState {
    armed_state_with(seed, GameConfig::default())
}

/// Like [`armed_state`] with explicit configuration.
#[must_use]
pub fn armed_state_with(seed: u64, config: GameConfig) -> GameState {
    let mut gs = GameState::with_config(seed, config);
    gs.add_weapon(colt_peacemaker()).expect("valid fixture");
    gs.add_weapon(steel_dagger()).expect("valid fixture");
    gs.add_weapon(unarmed()).expect("valid fixture");
    gs
}

/// The stat line used by the two duelists in the ranged-duel scenario.
#[must_use]
pub const fn gunslinger_stats() -> Stats {
    Stats {
        dexterity: 77,
        strength: 35,
        reflexes: 54,
        coolness: 82,
        health: 87,
    }
}

/// A revolver-armed combatant with the given pistol skill.
#[must_use]
pub fn gunslinger(name: &str, faction: FactionId, pistol_skill: u8) -> Character {
    let mut character = Character::new(
        name,
        faction,
        gunslinger_stats(),
        87,
        Some(CarriedRanged {
            weapon: "colt_peacemaker".to_string(),
            state: "holstered".to_string(),
            ammo: 6,
            firing_mode: FiringMode::Single,
            burst_fired: 0,
        }),
        CarriedMelee {
            weapon: "unarmed".to_string(),
            state: "melee_ready".to_string(),
        },
    );
    character.archetype = "gunslinger".to_string();
    if pistol_skill > 0 {
        character.skills.insert("pistol".to_string(), pistol_skill);
    }
    character
}

/// A dagger-armed combatant fighting in melee mode.
#[must_use]
pub fn duelist(name: &str, faction: FactionId, blade_skill: u8) -> Character {
    let mut character = Character::new(
        name,
        faction,
        Stats::average(),
        70,
        None,
        CarriedMelee {
            weapon: "steel_dagger".to_string(),
            state: "sheathed".to_string(),
        },
    );
    character.archetype = "duelist".to_string();
    character.combat_mode = CombatMode::Melee;
    if blade_skill > 0 {
        character.skills.insert("blade".to_string(), blade_skill);
    }
    character
}

/// Spawn a gunslinger and return its unit id.
pub fn spawn_gunslinger(gs: &mut GameState, faction: FactionId, position: Vec2, skill: u8) -> UnitId {
    let name = format!("Gunslinger {faction}");
    gs.spawn_unit(gunslinger(&name, faction, skill), position, Some(0.0))
        .expect("fixture spawn")
}

/// Spawn a duelist with the dagger already in hand.
pub fn spawn_duelist(gs: &mut GameState, faction: FactionId, position: Vec2) -> UnitId {
    let name = format!("Duelist {faction}");
    let id = gs
        .spawn_unit(duelist(&name, faction, 2), position, Some(0.0))
        .expect("fixture spawn");
    ready_melee(gs, id);
    id
}

/// Skip the unsheathe animation: put the melee weapon straight into
/// its readied state.
pub fn ready_melee(gs: &mut GameState, id: UnitId) {
    if let Some(unit) = gs.units.get_mut(id) {
        unit.character.melee.state = "melee_ready".to_string();
    }
}
