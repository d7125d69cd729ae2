//! Wounds, their penalties, and hesitation durations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::MovementType;

/// Body locations a hit can strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyLocation {
    /// Head.
    Head,
    /// Chest.
    Chest,
    /// Abdomen.
    Abdomen,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
}

impl BodyLocation {
    /// Fixed hit-location distribution, in cumulative percentile bands:
    /// head 10, chest 25, abdomen 20, arms 10 each, left leg 12, right leg 13.
    #[must_use]
    pub fn from_roll(roll: u8) -> Self {
        match roll {
            1..=10 => Self::Head,
            11..=35 => Self::Chest,
            36..=55 => Self::Abdomen,
            56..=65 => Self::LeftArm,
            66..=75 => Self::RightArm,
            76..=87 => Self::LeftLeg,
            _ => Self::RightLeg,
        }
    }

    /// Whether this location is a leg (drives movement caps).
    #[must_use]
    pub const fn is_leg(&self) -> bool {
        matches!(self, Self::LeftLeg | Self::RightLeg)
    }

    /// Whether a critical wound here is instantly incapacitating.
    #[must_use]
    pub const fn is_vital(&self) -> bool {
        matches!(self, Self::Head | Self::Chest)
    }
}

impl fmt::Display for BodyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Head => "head",
            Self::Chest => "chest",
            Self::Abdomen => "abdomen",
            Self::LeftArm => "left arm",
            Self::RightArm => "right arm",
            Self::LeftLeg => "left leg",
            Self::RightLeg => "right leg",
        };
        write!(f, "{name}")
    }
}

/// How badly a hit wounded the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WoundSeverity {
    /// Glancing; minimal damage, no hesitation.
    Scratch,
    /// Light wound.
    Light,
    /// Serious wound.
    Serious,
    /// Critical wound.
    Critical,
}

impl WoundSeverity {
    /// Severity from the margin by which the attack roll beat the hit chance.
    #[must_use]
    pub const fn from_margin(margin: i32) -> Self {
        if margin >= 60 {
            Self::Critical
        } else if margin >= 30 {
            Self::Serious
        } else if margin >= 0 {
            Self::Light
        } else {
            Self::Scratch
        }
    }

    /// Damage multiplier applied to the weapon's base damage.
    #[must_use]
    pub const fn damage_multiplier(&self) -> f64 {
        match self {
            Self::Scratch => 0.25,
            Self::Light => 1.0,
            Self::Serious => 1.5,
            Self::Critical => 2.5,
        }
    }

    /// Hit-chance penalty this wound inflicts on its bearer's attacks.
    #[must_use]
    pub const fn attack_penalty(&self) -> i32 {
        match self {
            Self::Scratch => 0,
            Self::Light => -2,
            Self::Serious => -5,
            Self::Critical => -10,
        }
    }

    /// Hesitation in ticks when this wound lands. Scratches cause none.
    #[must_use]
    pub const fn hesitation_ticks(&self) -> u32 {
        match self {
            Self::Scratch => 0,
            Self::Light => 30,
            Self::Serious => 60,
            Self::Critical => 120,
        }
    }
}

impl fmt::Display for WoundSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scratch => "scratch",
            Self::Light => "light",
            Self::Serious => "serious",
            Self::Critical => "critical",
        };
        write!(f, "{name}")
    }
}

/// A wound carried by a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    /// Where it landed.
    pub location: BodyLocation,
    /// How bad it is.
    pub severity: WoundSeverity,
    /// Damage dealt when inflicted.
    pub damage: i32,
    /// Wound-description noun of the inflicting weapon ("bullet", "blade").
    pub noun: String,
    /// Tick the wound was inflicted.
    pub tick: u64,
}

/// Aggregate hit-chance penalty from all wounds. Never worse than -25.
#[must_use]
pub fn wound_attack_penalty(wounds: &[Wound]) -> i32 {
    let total: i32 = wounds.iter().map(|w| w.severity.attack_penalty()).sum();
    total.max(-25)
}

/// Fastest movement the character's leg wounds still allow.
///
/// A serious or critical leg wound caps movement at a crawl; a light
/// leg wound caps it at a jog. Scratches do not slow anyone down.
#[must_use]
pub fn leg_wound_cap(wounds: &[Wound]) -> MovementType {
    let mut cap = MovementType::Run;
    for wound in wounds.iter().filter(|w| w.location.is_leg()) {
        match wound.severity {
            WoundSeverity::Serious | WoundSeverity::Critical => return MovementType::Crawl,
            WoundSeverity::Light => cap = MovementType::Jog,
            WoundSeverity::Scratch => {}
        }
    }
    cap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wound(location: BodyLocation, severity: WoundSeverity) -> Wound {
        Wound {
            location,
            severity,
            damage: 5,
            noun: "bullet".to_string(),
            tick: 0,
        }
    }

    #[test]
    fn test_location_bands_cover_percentile() {
        let mut head = 0;
        let mut chest = 0;
        for roll in 1..=100u8 {
            match BodyLocation::from_roll(roll) {
                BodyLocation::Head => head += 1,
                BodyLocation::Chest => chest += 1,
                _ => {}
            }
        }
        assert_eq!(head, 10);
        assert_eq!(chest, 25);
    }

    #[test]
    fn test_severity_margins() {
        assert_eq!(WoundSeverity::from_margin(60), WoundSeverity::Critical);
        assert_eq!(WoundSeverity::from_margin(59), WoundSeverity::Serious);
        assert_eq!(WoundSeverity::from_margin(30), WoundSeverity::Serious);
        assert_eq!(WoundSeverity::from_margin(29), WoundSeverity::Light);
        assert_eq!(WoundSeverity::from_margin(0), WoundSeverity::Light);
        assert_eq!(WoundSeverity::from_margin(-1), WoundSeverity::Scratch);
    }

    #[test]
    fn test_attack_penalty_floor() {
        let wounds: Vec<Wound> = (0..5)
            .map(|_| wound(BodyLocation::Chest, WoundSeverity::Critical))
            .collect();
        assert_eq!(wound_attack_penalty(&wounds), -25);
    }

    #[test]
    fn test_attack_penalty_sums() {
        let wounds = vec![
            wound(BodyLocation::LeftArm, WoundSeverity::Light),
            wound(BodyLocation::Chest, WoundSeverity::Serious),
        ];
        assert_eq!(wound_attack_penalty(&wounds), -7);
    }

    #[test]
    fn test_leg_wound_caps() {
        assert_eq!(leg_wound_cap(&[]), MovementType::Run);
        assert_eq!(
            leg_wound_cap(&[wound(BodyLocation::LeftLeg, WoundSeverity::Light)]),
            MovementType::Jog
        );
        assert_eq!(
            leg_wound_cap(&[
                wound(BodyLocation::LeftLeg, WoundSeverity::Light),
                wound(BodyLocation::RightLeg, WoundSeverity::Serious)
            ]),
            MovementType::Crawl
        );
        // Arm wounds never slow movement.
        assert_eq!(
            leg_wound_cap(&[wound(BodyLocation::LeftArm, WoundSeverity::Critical)]),
            MovementType::Run
        );
    }
}
