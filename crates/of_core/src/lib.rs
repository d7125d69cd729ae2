//! # OpenFields Core
//!
//! Deterministic tick-driven combat core for OpenFields2.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded PRNG)
//!
//! This separation enables:
//! - Headless scenario runs and CI verification
//! - Seed-exact replays
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`game_state`] - The root aggregate and per-tick update order
//! - [`units`] / [`character`] - The data model
//! - [`weapons`] / [`state_machine`] - Weapon definitions and progression
//! - [`attack`] / [`defense`] / [`wounds`] - The resolution pipeline
//!   (auto-targeting and target zones run inside the tick loop)
//! - [`commands`] - The external command surface
//! - [`events`] - The scheduled-event queue
//! - [`save`] / [`snapshot`] - Persistence and render views
//! - [`data`] - JSON record schemas and loaders

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attack;
pub mod character;
pub mod commands;
pub mod data;
pub mod defense;
pub mod error;
pub mod events;
pub mod factions;
pub mod game_state;
pub mod hooks;
pub mod math;
mod movement;
pub mod rng;
pub mod save;
pub mod snapshot;
pub mod state_machine;
pub mod stats;
mod targeting;
pub mod units;
pub mod weapons;
pub mod wounds;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attack::{ImpactOutcome, ImpactRecord};
    pub use crate::character::{
        AimingSpeed, CarriedMelee, CarriedRanged, Character, CombatMode, CombatTally,
        DefenseState, Handedness, MovementType, TargetZone,
    };
    pub use crate::commands::Command;
    pub use crate::data::{AlignmentRecord, CharacterRecord, WeaponRecord};
    pub use crate::error::{CoreError, Result};
    pub use crate::events::{EventFilter, EventKind, EventQueue, ScheduledEvent};
    pub use crate::factions::{Alignment, AlignmentTable, FactionId};
    pub use crate::game_state::{GameConfig, GameState, TickEvents};
    pub use crate::hooks::{CombatHooks, NullHooks};
    pub use crate::math::{Vec2, PIXELS_PER_FOOT, TICKS_PER_SECOND};
    pub use crate::save::{SaveGame, SAVE_VERSION};
    pub use crate::snapshot::{CharacterSheet, FieldSnapshot, UnitSnapshot};
    pub use crate::stats::{stat_modifier, SkillSet, Stats};
    pub use crate::units::{Unit, UnitId, UnitRoster, UNIT_RADIUS};
    pub use crate::weapons::{
        FiringMode, MeleeSubtype, MeleeWeapon, RangedWeapon, Weapon, WeaponId, WeaponRenderState,
    };
    pub use crate::wounds::{BodyLocation, Wound, WoundSeverity};
}
