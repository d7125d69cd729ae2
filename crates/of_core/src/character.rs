//! Characters: the combat-relevant stats and state bound to a unit.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::Vec2;
use crate::stats::{SkillSet, Stats};
use crate::units::UnitId;
use crate::weapons::{FiringMode, WeaponId};
use crate::wounds::{leg_wound_cap, Wound};

/// Hold state every character starts with and resets to.
pub const DEFAULT_HOLD_STATE: &str = "aiming";

/// Accumulated aiming ticks at which the very-careful bonus saturates.
pub const VERY_CAREFUL_SATURATION_TICKS: u32 = 300;

/// Which carried weapon a character fights with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatMode {
    /// Fight with the ranged weapon.
    #[default]
    Ranged,
    /// Fight with the melee weapon.
    Melee,
}

impl CombatMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ranged => Self::Melee,
            Self::Melee => Self::Ranged,
        }
    }
}

/// Movement gait. Order matters: faster gaits compare greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum MovementType {
    /// 1 foot per second.
    Crawl,
    /// 3 feet per second.
    #[default]
    Walk,
    /// 6 feet per second.
    Jog,
    /// 9 feet per second.
    Run,
}

impl MovementType {
    /// Base speed in feet per second.
    #[must_use]
    pub const fn speed_fps(self) -> f64 {
        match self {
            Self::Crawl => 1.0,
            Self::Walk => 3.0,
            Self::Jog => 6.0,
            Self::Run => 9.0,
        }
    }

    /// Hit-chance penalty for shooting (or being shot) at this gait.
    /// Crawling is stable enough to cost nothing.
    #[must_use]
    pub const fn firing_penalty(self) -> i32 {
        match self {
            Self::Crawl => 0,
            Self::Walk => 10,
            Self::Jog => 20,
            Self::Run => 30,
        }
    }
}

/// How deliberately a character aims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AimingSpeed {
    /// Slow, building an accuracy bonus over accumulated aiming time.
    VeryCareful,
    /// Steady aim, +15.
    Careful,
    /// No modifier.
    #[default]
    Normal,
    /// Snap shooting, -20.
    Quick,
}

impl AimingSpeed {
    /// Hit-chance modifier, given accumulated aiming ticks on the
    /// current target (only very-careful aim consumes it).
    #[must_use]
    pub fn hit_modifier(self, aiming_ticks: u32) -> i32 {
        match self {
            Self::Careful => 15,
            Self::Normal => 0,
            Self::Quick => -20,
            Self::VeryCareful => {
                // Smooth saturating ramp to +30 at the saturation point.
                let x = (f64::from(aiming_ticks) / f64::from(VERY_CAREFUL_SATURATION_TICKS))
                    .min(1.0);
                let smooth = x * x * (3.0 - 2.0 * x);
                (30.0 * smooth).round() as i32
            }
        }
    }
}

/// Which hand(s) a character favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    /// Left-handed.
    Left,
    /// Right-handed.
    #[default]
    Right,
    /// Either hand.
    Ambidextrous,
}

/// Melee defense readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefenseState {
    /// May attempt a defensive roll against the next melee impact.
    #[default]
    Ready,
    /// Currently executing a defense.
    Defending,
    /// Spent; incoming impacts bypass defense until the cooldown ends.
    Cooldown,
}

/// Axis-aligned world rectangle used as a targeting preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl TargetZone {
    /// Build a zone from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Point-in-rectangle test on a target's centre.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// A carried ranged weapon: reference to the definition plus the
/// per-character machine state and magazine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarriedRanged {
    /// Weapon definition id.
    pub weapon: WeaponId,
    /// Current state in the weapon's state graph.
    pub state: String,
    /// Rounds remaining in the magazine.
    pub ammo: u32,
    /// Selected firing mode.
    pub firing_mode: FiringMode,
    /// Shots fired in the burst currently underway.
    pub burst_fired: u8,
}

/// A carried melee weapon. Every character has one; "Unarmed" at minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarriedMelee {
    /// Weapon definition id.
    pub weapon: WeaponId,
    /// Current state in the weapon's state graph.
    pub state: String,
}

/// Attack statistics for one combat type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatTally {
    /// Attacks attempted.
    pub attempted: u32,
    /// Attacks that hit.
    pub successful: u32,
    /// Wounds inflicted on targets.
    pub wounds_inflicted: u32,
}

/// Combatant stats and combat state.
///
/// References to other units are IDs resolved through the roster; the
/// character never holds a pointer to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Faction membership.
    pub faction: FactionId,
    /// Base attributes.
    pub stats: Stats,
    /// Archetype label (informational).
    pub archetype: String,
    /// Hand preference.
    pub handedness: Handedness,
    /// Current health. Zero means incapacitated.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Wounds received, oldest first.
    pub wounds: Vec<Wound>,
    /// Skill levels by name.
    pub skills: SkillSet,
    /// Carried ranged weapon, if any.
    pub ranged: Option<CarriedRanged>,
    /// Carried melee weapon. Never absent.
    pub melee: CarriedMelee,
    /// Active combat mode.
    pub combat_mode: CombatMode,
    /// Current gait for movement orders.
    pub movement_type: MovementType,
    /// Current aiming deliberateness.
    pub aiming_speed: AimingSpeed,
    /// Current combat target.
    pub target: Option<UnitId>,
    /// Target before the last change, for resume-after-cease-fire.
    pub previous_target: Option<UnitId>,
    /// Targeting-preference rectangle, fixed in world space.
    pub target_zone: Option<TargetZone>,
    /// Whether the auto-targeting evaluator runs for this character.
    pub auto_target: bool,
    /// Keep re-attacking the same manual target after each cycle.
    pub persistent_attack: bool,
    /// Weapon state at which progression halts when not attacking.
    pub hold_state: String,
    /// Ticks spent continuously aiming at the current target.
    pub aiming_ticks: u32,
    /// Cached bearing to the last combat target, in degrees.
    pub last_target_facing: Option<f64>,
    /// Ranged attack statistics.
    pub ranged_tally: CombatTally,
    /// Melee attack statistics.
    pub melee_tally: CombatTally,
    /// Ticks of wound hesitation remaining.
    pub wound_hesitation: u32,
    /// Ticks of bravery hesitation remaining.
    pub bravery_hesitation: u32,
    /// Melee defense readiness.
    pub defense_state: DefenseState,
    /// Absolute tick at which defense cooldown ends.
    pub defense_cooldown_end: u64,
    /// Absolute tick at which melee attack recovery ends.
    pub melee_recovery_end: u64,
    /// An attack cycle is underway or queued.
    pub is_attacking: bool,
    /// Out of the fight. Incapacitated characters do not act.
    pub incapacitated: bool,
    /// Transient: the last attack cycle finished this tick, so the
    /// re-engagement logic should run. Never persisted.
    #[serde(skip)]
    pub attack_cycle_done: bool,
}

impl Character {
    /// Create a character with full health and quiet combat state.
    ///
    /// `melee` should be the "Unarmed" definition when the character
    /// carries no real melee weapon.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        faction: FactionId,
        stats: Stats,
        max_health: i32,
        ranged: Option<CarriedRanged>,
        melee: CarriedMelee,
    ) -> Self {
        Self {
            name: name.into(),
            faction,
            stats,
            archetype: String::new(),
            handedness: Handedness::default(),
            health: max_health,
            max_health,
            wounds: Vec::new(),
            skills: SkillSet::new(),
            ranged,
            melee,
            combat_mode: CombatMode::Ranged,
            movement_type: MovementType::default(),
            aiming_speed: AimingSpeed::default(),
            target: None,
            previous_target: None,
            target_zone: None,
            auto_target: false,
            persistent_attack: false,
            hold_state: DEFAULT_HOLD_STATE.to_string(),
            aiming_ticks: 0,
            last_target_facing: None,
            ranged_tally: CombatTally::default(),
            melee_tally: CombatTally::default(),
            wound_hesitation: 0,
            bravery_hesitation: 0,
            defense_state: DefenseState::default(),
            defense_cooldown_end: 0,
            melee_recovery_end: 0,
            is_attacking: false,
            incapacitated: false,
            attack_cycle_done: false,
        }
    }

    /// Weapon id of the active combat mode. Ranged mode with no ranged
    /// weapon falls back to the melee weapon.
    #[must_use]
    pub fn active_weapon_id(&self) -> &WeaponId {
        match self.combat_mode {
            CombatMode::Ranged => self
                .ranged
                .as_ref()
                .map_or(&self.melee.weapon, |r| &r.weapon),
            CombatMode::Melee => &self.melee.weapon,
        }
    }

    /// Current weapon state of the active combat mode.
    #[must_use]
    pub fn active_weapon_state(&self) -> &str {
        match self.combat_mode {
            CombatMode::Ranged => self
                .ranged
                .as_ref()
                .map_or(self.melee.state.as_str(), |r| r.state.as_str()),
            CombatMode::Melee => &self.melee.state,
        }
    }

    /// Combat mode actually usable: ranged mode without a ranged weapon
    /// falls back to melee.
    #[must_use]
    pub fn effective_mode(&self) -> CombatMode {
        if self.combat_mode == CombatMode::Ranged && self.ranged.is_none() {
            CombatMode::Melee
        } else {
            self.combat_mode
        }
    }

    /// Whether a new melee attack may begin at `tick`.
    #[must_use]
    pub const fn can_melee_attack(&self, tick: u64) -> bool {
        tick >= self.melee_recovery_end
    }

    /// Whether hesitation currently blocks initiating attacks.
    #[must_use]
    pub const fn hesitating(&self) -> bool {
        self.wound_hesitation > 0 || self.bravery_hesitation > 0
    }

    /// Fastest gait the character's leg wounds allow.
    #[must_use]
    pub fn movement_cap(&self) -> MovementType {
        leg_wound_cap(&self.wounds)
    }

    /// Gait actually used for movement: the ordered type clamped by wounds.
    #[must_use]
    pub fn effective_movement(&self) -> MovementType {
        self.movement_type.min(self.movement_cap())
    }

    /// Set a new target, caching the old one and resetting the
    /// accumulated aiming time when the target actually changes.
    pub fn set_target(&mut self, target: Option<UnitId>) {
        if self.target != target {
            if self.target.is_some() {
                self.previous_target = self.target;
            }
            self.aiming_ticks = 0;
            if let Some(r) = self.ranged.as_mut() {
                r.burst_fired = 0;
            }
            self.target = target;
        }
    }

    /// Tally for the given combat type.
    pub fn tally_mut(&mut self, mode: CombatMode) -> &mut CombatTally {
        match mode {
            CombatMode::Ranged => &mut self.ranged_tally,
            CombatMode::Melee => &mut self.melee_tally,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fists() -> CarriedMelee {
        CarriedMelee {
            weapon: "unarmed".to_string(),
            state: "melee_ready".to_string(),
        }
    }

    fn test_character() -> Character {
        Character::new("Tester", 1, Stats::average(), 80, None, fists())
    }

    #[test]
    fn test_movement_order_for_clamping() {
        assert!(MovementType::Crawl < MovementType::Walk);
        assert!(MovementType::Jog < MovementType::Run);
        assert_eq!(
            MovementType::Run.min(MovementType::Jog),
            MovementType::Jog
        );
    }

    #[test]
    fn test_aim_modifier_fixed_speeds() {
        assert_eq!(AimingSpeed::Careful.hit_modifier(0), 15);
        assert_eq!(AimingSpeed::Normal.hit_modifier(500), 0);
        assert_eq!(AimingSpeed::Quick.hit_modifier(0), -20);
    }

    #[test]
    fn test_very_careful_ramps_and_saturates() {
        assert_eq!(AimingSpeed::VeryCareful.hit_modifier(0), 0);
        let mid = AimingSpeed::VeryCareful.hit_modifier(150);
        assert!(mid > 0 && mid < 30);
        assert_eq!(AimingSpeed::VeryCareful.hit_modifier(300), 30);
        assert_eq!(AimingSpeed::VeryCareful.hit_modifier(10_000), 30);
    }

    #[test]
    fn test_zone_corners_normalize() {
        let zone = TargetZone::from_corners(Vec2::new(80.0, 20.0), Vec2::new(20.0, 80.0));
        assert!(zone.contains(Vec2::new(30.0, 30.0)));
        assert!(!zone.contains(Vec2::new(25.0, 0.0)));
        assert!(zone.contains(Vec2::new(20.0, 80.0)));
    }

    #[test]
    fn test_set_target_resets_aiming_and_caches_previous() {
        let mut character = test_character();
        character.set_target(Some(7));
        character.aiming_ticks = 90;
        character.set_target(Some(9));
        assert_eq!(character.previous_target, Some(7));
        assert_eq!(character.aiming_ticks, 0);

        // Re-setting the same target keeps accumulated aim.
        character.aiming_ticks = 40;
        character.set_target(Some(9));
        assert_eq!(character.aiming_ticks, 40);
    }

    #[test]
    fn test_melee_recovery_gate() {
        let mut character = test_character();
        character.melee_recovery_end = 120;
        assert!(!character.can_melee_attack(75));
        assert!(character.can_melee_attack(120));
    }
}
