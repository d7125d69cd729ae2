//! Character record schema.

use serde::{Deserialize, Serialize};

use crate::character::{CarriedMelee, CarriedRanged, Character, Handedness};
use crate::factions::FactionId;
use crate::math::Vec2;
use crate::stats::{SkillSet, Stats};
use crate::weapons::FiringMode;

/// Stat block as it appears in character data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Dexterity, 1-100.
    pub dexterity: u8,
    /// Strength, 1-100.
    pub strength: u8,
    /// Reflexes, 1-100.
    pub reflexes: u8,
    /// Coolness, 1-100.
    pub coolness: u8,
    /// Health attribute, 1-100.
    pub health: u8,
}

impl From<StatsRecord> for Stats {
    fn from(r: StatsRecord) -> Self {
        Self {
            dexterity: r.dexterity,
            strength: r.strength,
            reflexes: r.reflexes,
            coolness: r.coolness,
            health: r.health,
        }
    }
}

/// A character as authored in scenario data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Display name.
    pub name: String,
    /// Faction id.
    pub faction: FactionId,
    /// Base attributes.
    pub stats: StatsRecord,
    /// Archetype label.
    #[serde(default)]
    pub archetype: String,
    /// Hand preference.
    #[serde(default)]
    pub handedness: Handedness,
    /// Maximum health; defaults to the health attribute.
    #[serde(default)]
    pub health: Option<i32>,
    /// Skill levels by name.
    #[serde(default)]
    pub skills: SkillSet,
    /// Ranged weapon id, if carried.
    #[serde(default)]
    pub ranged_weapon: Option<String>,
    /// Melee weapon id; every character gets at least "unarmed".
    #[serde(default = "default_melee_weapon")]
    pub melee_weapon: String,
    /// Starting position in pixels.
    pub position: Vec2,
    /// Starting facing in degrees; seeded-random when absent.
    #[serde(default)]
    pub facing: Option<f64>,
}

impl CharacterRecord {
    /// Build the character this record describes.
    ///
    /// Weapon states are placeholders here; they are normalized to each
    /// weapon's default state when the unit is spawned.
    #[must_use]
    pub fn into_character(self, ammo_capacity_of: impl Fn(&str) -> u32) -> Character {
        let max_health = self.health.unwrap_or(i32::from(self.stats.health));
        let ranged = self.ranged_weapon.map(|weapon| {
            let ammo = ammo_capacity_of(&weapon);
            CarriedRanged {
                weapon,
                state: String::new(),
                ammo,
                firing_mode: FiringMode::Single,
                burst_fired: 0,
            }
        });
        let melee = CarriedMelee {
            weapon: self.melee_weapon,
            state: String::new(),
        };

        let mut character = Character::new(
            self.name,
            self.faction,
            self.stats.into(),
            max_health,
            ranged,
            melee,
        );
        character.archetype = self.archetype;
        character.handedness = self.handedness;
        character.skills = self.skills;
        character
    }
}

fn default_melee_weapon() -> String {
    "unarmed".to_string()
}
