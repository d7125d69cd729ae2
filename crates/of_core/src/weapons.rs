//! Weapon definitions and their state graphs.
//!
//! A weapon is immutable data shared by every character carrying it:
//! per-character state (current weapon state, ammunition) lives on the
//! [`crate::character::Character`]. Ranged and melee weapons are variants
//! of one tagged sum sharing [`WeaponCommon`]; decision points match on
//! the variant rather than dispatching through a trait object.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Weapon identifier (the loader's string id).
pub type WeaponId = String;

/// Default shots per burst for burst-capable weapons.
pub const DEFAULT_BURST_SIZE: u8 = 3;

/// Default defense cooldown in ticks for melee weapons.
pub const DEFAULT_DEFENSE_COOLDOWN: u32 = 60;

/// Wound-description noun used when a weapon record omits one.
pub const DEFAULT_WOUND_NOUN: &str = "projectile";

/// One node in a weapon's state graph.
///
/// Each weapon declares its own ordered list; there is no global state
/// enum. `ticks` is the cost of leaving this state toward `next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStateDef {
    /// State name, e.g. "holstered", "aiming", "melee_ready".
    pub name: String,
    /// Name of the state this one transitions into.
    pub next: String,
    /// Ticks required to leave this state. Zero means instantaneous.
    pub ticks: u32,
}

/// Fields shared by ranged and melee weapons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponCommon {
    /// Stable string identifier.
    pub id: WeaponId,
    /// Display name.
    pub name: String,
    /// Base damage before severity multipliers.
    pub damage: i32,
    /// Noun used in wound messages ("bullet", "blade").
    pub wound_noun: String,
    /// Physical length in feet (informational; the renderer uses it).
    pub length_feet: f64,
    /// Free-form type tag ("revolver", "dagger").
    pub kind: String,
    /// Flat accuracy modifier added to hit chance.
    pub accuracy: i32,
    /// Ordered state graph.
    pub states: Vec<WeaponStateDef>,
    /// Name of the state a character starts in and resets to.
    pub initial_state: String,
    /// Combat skill that grants a hit bonus, if any.
    pub combat_skill: Option<String>,
}

impl WeaponCommon {
    /// Look up a state definition by name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&WeaponStateDef> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Position of a state in the declared order.
    #[must_use]
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }
}

/// Selective-fire setting of a ranged weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FiringMode {
    /// One shot per attack cycle.
    #[default]
    Single,
    /// A fixed burst; follow-up shots take a quick-aim penalty.
    Burst,
    /// Continuous fire; forces quick aiming after the first shot.
    FullAuto,
}

/// Reach class of a melee weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeleeSubtype {
    /// Fists, feet, improvised grappling.
    #[default]
    Unarmed,
    /// Knives and daggers.
    Short,
    /// Swords, clubs.
    Medium,
    /// Spears, staves.
    Long,
    /// Paired weapons.
    TwoWeapon,
}

/// A firearm or other ranged weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedWeapon {
    /// Shared weapon fields.
    pub common: WeaponCommon,
    /// Maximum effective range in feet. Hits beyond this are impossible.
    pub max_range_feet: f64,
    /// Projectile velocity in feet per second (informational).
    pub velocity_fps: f64,
    /// Magazine capacity.
    pub ammo_capacity: u32,
    /// Name of the reload state in the state graph.
    pub reload_state: String,
    /// Ticks a reload takes.
    pub reload_ticks: u32,
    /// Ticks from entering "firing" until the shot impacts.
    pub firing_delay: u32,
    /// Firing modes this weapon supports.
    pub modes: Vec<FiringMode>,
    /// Shots per burst when firing in burst mode.
    pub burst_size: u8,
}

/// A blade, club, or the ever-present pair of fists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeleeWeapon {
    /// Shared weapon fields.
    pub common: WeaponCommon,
    /// Reach class.
    pub subtype: MeleeSubtype,
    /// Reach in feet beyond the wielder's body.
    pub reach_feet: f64,
    /// Ticks from entering "melee_attacking" until impact.
    pub attack_speed: u32,
    /// Ticks after impact before another attack may begin.
    pub attack_cooldown: u32,
    /// Defensive quality, 1-100; half of it feeds the defense roll.
    pub defend_score: i32,
    /// Ticks of defense cooldown after a defensive attempt.
    pub defense_cooldown: u32,
    /// Ticks to ready the weapon from its carried position.
    pub readying_ticks: u32,
    /// Wielded in one hand.
    pub one_handed: bool,
    /// Derived from a ranged weapon (bayonet, clubbed rifle).
    pub from_ranged: bool,
}

/// A weapon definition: ranged or melee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Weapon {
    /// Ranged variant.
    Ranged(RangedWeapon),
    /// Melee variant.
    Melee(MeleeWeapon),
}

impl Weapon {
    /// Shared fields regardless of variant.
    #[must_use]
    pub fn common(&self) -> &WeaponCommon {
        match self {
            Self::Ranged(w) => &w.common,
            Self::Melee(w) => &w.common,
        }
    }

    /// The weapon-specific default state (holstered, slung, sheathed...).
    #[must_use]
    pub fn default_state(&self) -> &str {
        &self.common().initial_state
    }

    /// State the weapon must reach for an attack to fire.
    #[must_use]
    pub const fn attack_state(&self) -> &'static str {
        match self {
            Self::Ranged(_) => "firing",
            Self::Melee(_) => "melee_attacking",
        }
    }

    /// Validate the state graph at load time.
    ///
    /// Every `next` reference must resolve, the initial state must exist,
    /// and numeric fields must be positive where the simulation divides by
    /// or waits on them. Fails fast identifying the weapon id.
    pub fn validate(&self) -> Result<()> {
        let common = self.common();
        let id = &common.id;
        if common.states.is_empty() {
            return Err(CoreError::data(id, "weapon declares no states"));
        }
        if common.state(&common.initial_state).is_none() {
            return Err(CoreError::data(
                id,
                format!("initial state '{}' is not declared", common.initial_state),
            ));
        }
        for state in &common.states {
            if common.state(&state.next).is_none() {
                return Err(CoreError::data(
                    id,
                    format!(
                        "state '{}' transitions to undeclared state '{}'",
                        state.name, state.next
                    ),
                ));
            }
        }
        if common.damage < 1 {
            return Err(CoreError::data(id, "damage must be at least 1"));
        }
        match self {
            Self::Ranged(w) => {
                if w.max_range_feet <= 0.0 {
                    return Err(CoreError::data(id, "max range must be positive"));
                }
                if w.firing_delay == 0 {
                    return Err(CoreError::data(id, "firing delay must be at least 1 tick"));
                }
                if w.reload_ticks == 0 {
                    return Err(CoreError::data(id, "reload must take at least 1 tick"));
                }
                if w.ammo_capacity == 0 {
                    return Err(CoreError::data(id, "ammo capacity must be at least 1"));
                }
                if common.state(&w.reload_state).is_none() {
                    return Err(CoreError::data(
                        id,
                        format!("reload state '{}' is not declared", w.reload_state),
                    ));
                }
                if w.modes.is_empty() {
                    return Err(CoreError::data(id, "weapon supports no firing modes"));
                }
            }
            Self::Melee(w) => {
                if w.attack_speed == 0 {
                    return Err(CoreError::data(id, "attack speed must be at least 1 tick"));
                }
                if w.reach_feet < 0.0 {
                    return Err(CoreError::data(id, "reach must not be negative"));
                }
                if !(1..=100).contains(&w.defend_score) {
                    return Err(CoreError::data(id, "defend score must be in [1, 100]"));
                }
            }
        }
        Ok(())
    }
}

/// What the renderer should draw for a weapon in a given state.
///
/// This projection is the single piece of weapon-state information the
/// rendering layer consumes from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponRenderState {
    /// Weapon stowed or in transit from stowed.
    Hidden,
    /// Weapon in hand but not leveled.
    Ready,
    /// Weapon leveled, firing, or recovering from a shot.
    Attacking,
}

/// Project a weapon state name onto its render state.
#[must_use]
pub fn render_state(state_name: &str) -> WeaponRenderState {
    match state_name {
        "drawing" | "sheathed" | "holstered" | "slung" | "unsheathing" => WeaponRenderState::Hidden,
        "aiming" | "firing" | "recovering" | "melee_attacking" => WeaponRenderState::Attacking,
        // ready, reloading, pointedfromhip, grippinginholster, melee_ready
        _ => WeaponRenderState::Ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pistol() -> Weapon {
        Weapon::Ranged(RangedWeapon {
            common: WeaponCommon {
                id: "test_pistol".to_string(),
                name: "Test Pistol".to_string(),
                damage: 6,
                wound_noun: "bullet".to_string(),
                length_feet: 1.0,
                kind: "revolver".to_string(),
                accuracy: 10,
                states: vec![
                    WeaponStateDef {
                        name: "holstered".to_string(),
                        next: "drawing".to_string(),
                        ticks: 15,
                    },
                    WeaponStateDef {
                        name: "drawing".to_string(),
                        next: "ready".to_string(),
                        ticks: 30,
                    },
                    WeaponStateDef {
                        name: "ready".to_string(),
                        next: "aiming".to_string(),
                        ticks: 30,
                    },
                    WeaponStateDef {
                        name: "aiming".to_string(),
                        next: "firing".to_string(),
                        ticks: 15,
                    },
                    WeaponStateDef {
                        name: "firing".to_string(),
                        next: "recovering".to_string(),
                        ticks: 5,
                    },
                    WeaponStateDef {
                        name: "recovering".to_string(),
                        next: "aiming".to_string(),
                        ticks: 30,
                    },
                    WeaponStateDef {
                        name: "reloading".to_string(),
                        next: "ready".to_string(),
                        ticks: 120,
                    },
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
            burst_size: DEFAULT_BURST_SIZE,
        })
    }

    #[test]
    fn test_valid_weapon_passes() {
        assert!(pistol().validate().is_ok());
    }

    #[test]
    fn test_dangling_next_state_fails() {
        let mut weapon = pistol();
        if let Weapon::Ranged(w) = &mut weapon {
            w.common.states[0].next = "nonexistent".to_string();
        }
        let err = weapon.validate().unwrap_err();
        assert!(err.to_string().contains("test_pistol"));
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_zero_firing_delay_fails() {
        let mut weapon = pistol();
        if let Weapon::Ranged(w) = &mut weapon {
            w.firing_delay = 0;
        }
        assert!(weapon.validate().is_err());
    }

    #[test]
    fn test_render_state_projection() {
        assert_eq!(render_state("holstered"), WeaponRenderState::Hidden);
        assert_eq!(render_state("unsheathing"), WeaponRenderState::Hidden);
        assert_eq!(render_state("grippinginholster"), WeaponRenderState::Ready);
        assert_eq!(render_state("pointedfromhip"), WeaponRenderState::Ready);
        assert_eq!(render_state("reloading"), WeaponRenderState::Ready);
        assert_eq!(render_state("aiming"), WeaponRenderState::Attacking);
        assert_eq!(render_state("melee_attacking"), WeaponRenderState::Attacking);
        assert_eq!(render_state("melee_ready"), WeaponRenderState::Ready);
    }
}
