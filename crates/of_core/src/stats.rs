//! Combatant stat blocks and the shared stat-to-modifier curve.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Skill levels run from 0 (untrained) to 9 (master).
pub const MAX_SKILL_LEVEL: u8 = 9;

/// Hit-chance bonus per skill level.
pub const SKILL_BONUS_PER_LEVEL: i32 = 5;

/// A character's base attributes, each in [1, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Manual precision; drives attack and defense rolls.
    pub dexterity: u8,
    /// Physical power; adds to melee damage.
    pub strength: u8,
    /// Reaction speed.
    pub reflexes: u8,
    /// Composure under fire; drives bravery checks.
    pub coolness: u8,
    /// Constitution; maximum health is generated from this per archetype.
    pub health: u8,
}

impl Stats {
    /// An average stat line, useful for tests and default archetypes.
    #[must_use]
    pub const fn average() -> Self {
        Self {
            dexterity: 50,
            strength: 50,
            reflexes: 50,
            coolness: 50,
            health: 50,
        }
    }

    /// Check every attribute is inside [1, 100].
    #[must_use]
    pub fn in_range(&self) -> bool {
        [
            self.dexterity,
            self.strength,
            self.reflexes,
            self.coolness,
            self.health,
        ]
        .iter()
        .all(|&s| (1..=100).contains(&s))
    }
}

/// Skill name to level mapping.
///
/// A `BTreeMap` keeps iteration order stable for hashing and snapshots.
pub type SkillSet = BTreeMap<String, u8>;

/// Map a stat in [1, 100] to a signed modifier in roughly [-20, +20].
///
/// A smooth step keeps mid-range stats near zero while the extremes pull
/// the full modifier. This single curve is shared by every stat-driven
/// roll in the simulation.
#[must_use]
pub fn stat_modifier(stat: u8) -> i32 {
    let clamped = stat.clamp(1, 100);
    let x = f64::from(clamped - 1) / 99.0;
    let smooth = x * x * (3.0 - 2.0 * x);
    (40.0 * smooth - 20.0).round() as i32
}

/// Look up a skill level, treating missing skills as untrained.
#[must_use]
pub fn skill_level(skills: &SkillSet, name: &str) -> u8 {
    skills.get(name).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_extremes() {
        assert_eq!(stat_modifier(1), -20);
        assert_eq!(stat_modifier(100), 20);
    }

    #[test]
    fn test_modifier_midpoint_near_zero() {
        assert!(stat_modifier(50).abs() <= 1);
    }

    #[test]
    fn test_modifier_monotonic() {
        let mut prev = stat_modifier(1);
        for stat in 2..=100 {
            let cur = stat_modifier(stat);
            assert!(cur >= prev, "modifier dipped at stat {stat}");
            prev = cur;
        }
    }

    #[test]
    fn test_modifier_out_of_range_clamps() {
        assert_eq!(stat_modifier(0), stat_modifier(1));
    }

    #[test]
    fn test_skill_lookup_defaults_to_zero() {
        let mut skills = SkillSet::new();
        skills.insert("pistol".to_string(), 3);
        assert_eq!(skill_level(&skills, "pistol"), 3);
        assert_eq!(skill_level(&skills, "rifle"), 0);
    }
}
