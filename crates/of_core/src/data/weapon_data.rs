//! Weapon record schemas.

use serde::{Deserialize, Serialize};

use crate::weapons::{
    FiringMode, MeleeSubtype, MeleeWeapon, RangedWeapon, Weapon, WeaponCommon, WeaponStateDef,
    DEFAULT_BURST_SIZE, DEFAULT_DEFENSE_COOLDOWN, DEFAULT_WOUND_NOUN,
};

/// One state-graph node in a weapon record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// State name.
    pub name: String,
    /// Next state name.
    pub next: String,
    /// Ticks to leave this state.
    pub ticks: u32,
}

impl StateRecord {
    fn into_def(self) -> WeaponStateDef {
        WeaponStateDef {
            name: self.name,
            next: self.next,
            ticks: self.ticks,
        }
    }
}

/// A ranged weapon record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangedRecord {
    /// Stable string id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base damage.
    pub damage: i32,
    /// Wound-description noun; defaults to "projectile".
    #[serde(default = "default_wound_noun")]
    pub wound_noun: String,
    /// Physical length in feet.
    #[serde(default)]
    pub length_feet: f64,
    /// Free-form type tag.
    #[serde(default)]
    pub kind: String,
    /// Flat accuracy modifier.
    #[serde(default)]
    pub accuracy: i32,
    /// Maximum effective range in feet.
    pub max_range_feet: f64,
    /// Projectile velocity in feet per second.
    #[serde(default)]
    pub velocity_fps: f64,
    /// Magazine capacity.
    pub ammo_capacity: u32,
    /// Reload state name; defaults to "reloading".
    #[serde(default = "default_reload_state")]
    pub reload_state: String,
    /// Reload duration in ticks.
    pub reload_ticks: u32,
    /// Ticks from entering "firing" to impact.
    pub firing_delay: u32,
    /// Supported firing modes; defaults to single fire only.
    #[serde(default = "default_modes")]
    pub modes: Vec<FiringMode>,
    /// Shots per burst; defaults to 3.
    #[serde(default = "default_burst_size")]
    pub burst_size: u8,
    /// Associated combat skill.
    #[serde(default)]
    pub combat_skill: Option<String>,
    /// State graph.
    pub states: Vec<StateRecord>,
    /// Default/initial state name.
    pub initial_state: String,
}

/// A melee weapon record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeleeRecord {
    /// Stable string id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base damage.
    pub damage: i32,
    /// Wound-description noun; defaults to "projectile".
    #[serde(default = "default_wound_noun")]
    pub wound_noun: String,
    /// Physical length in feet.
    #[serde(default)]
    pub length_feet: f64,
    /// Free-form type tag.
    #[serde(default)]
    pub kind: String,
    /// Flat accuracy modifier.
    #[serde(default)]
    pub accuracy: i32,
    /// Reach class.
    #[serde(default)]
    pub subtype: MeleeSubtype,
    /// Reach in feet.
    pub reach_feet: f64,
    /// Ticks from entering "melee_attacking" to impact.
    pub attack_speed: u32,
    /// Ticks after impact before the next attack.
    pub attack_cooldown: u32,
    /// Defensive quality, 1-100.
    pub defend_score: i32,
    /// Defense cooldown in ticks; defaults to 60.
    #[serde(default = "default_defense_cooldown")]
    pub defense_cooldown: u32,
    /// Readying time in ticks.
    #[serde(default)]
    pub readying_ticks: u32,
    /// One-handed flag.
    #[serde(default = "default_true")]
    pub one_handed: bool,
    /// Derived from a ranged weapon.
    #[serde(default)]
    pub from_ranged: bool,
    /// Associated combat skill.
    #[serde(default)]
    pub combat_skill: Option<String>,
    /// State graph.
    pub states: Vec<StateRecord>,
    /// Default/initial state name.
    pub initial_state: String,
}

/// A weapon record: ranged or melee, discriminated by a `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeaponRecord {
    /// Ranged weapon.
    Ranged(RangedRecord),
    /// Melee weapon.
    Melee(MeleeRecord),
}

impl WeaponRecord {
    /// Build the weapon definition this record describes.
    #[must_use]
    pub fn into_weapon(self) -> Weapon {
        match self {
            Self::Ranged(r) => Weapon::Ranged(RangedWeapon {
                common: WeaponCommon {
                    id: r.id,
                    name: r.name,
                    damage: r.damage,
                    wound_noun: r.wound_noun,
                    length_feet: r.length_feet,
                    kind: r.kind,
                    accuracy: r.accuracy,
                    states: r.states.into_iter().map(StateRecord::into_def).collect(),
                    initial_state: r.initial_state,
                    combat_skill: r.combat_skill,
                },
                max_range_feet: r.max_range_feet,
                velocity_fps: r.velocity_fps,
                ammo_capacity: r.ammo_capacity,
                reload_state: r.reload_state,
                reload_ticks: r.reload_ticks,
                firing_delay: r.firing_delay,
                modes: r.modes,
                burst_size: r.burst_size,
            }),
            Self::Melee(m) => Weapon::Melee(MeleeWeapon {
                common: WeaponCommon {
                    id: m.id,
                    name: m.name,
                    damage: m.damage,
                    wound_noun: m.wound_noun,
                    length_feet: m.length_feet,
                    kind: m.kind,
                    accuracy: m.accuracy,
                    states: m.states.into_iter().map(StateRecord::into_def).collect(),
                    initial_state: m.initial_state,
                    combat_skill: m.combat_skill,
                },
                subtype: m.subtype,
                reach_feet: m.reach_feet,
                attack_speed: m.attack_speed,
                attack_cooldown: m.attack_cooldown,
                defend_score: m.defend_score,
                defense_cooldown: m.defense_cooldown,
                readying_ticks: m.readying_ticks,
                one_handed: m.one_handed,
                from_ranged: m.from_ranged,
            }),
        }
    }
}

fn default_wound_noun() -> String {
    DEFAULT_WOUND_NOUN.to_string()
}

fn default_reload_state() -> String {
    "reloading".to_string()
}

fn default_modes() -> Vec<FiringMode> {
    vec![FiringMode::Single]
}

const fn default_burst_size() -> u8 {
    DEFAULT_BURST_SIZE
}

const fn default_defense_cooldown() -> u32 {
    DEFAULT_DEFENSE_COOLDOWN
}

const fn default_true() -> bool {
    true
}
