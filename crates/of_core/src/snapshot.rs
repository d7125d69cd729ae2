//! Copy-out snapshots for rendering and inspection.
//!
//! Renderers and input layers never touch live state; they read these
//! immutable views taken between ticks.

use serde::{Deserialize, Serialize};

use crate::character::{
    AimingSpeed, CombatMode, CombatTally, DefenseState, MovementType, TargetZone,
};
use crate::factions::FactionId;
use crate::game_state::GameState;
use crate::math::Vec2;
use crate::units::UnitId;
use crate::weapons::{render_state, FiringMode, WeaponRenderState};
use crate::wounds::Wound;

/// Per-unit render view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: UnitId,
    /// World position in pixels.
    pub position: Vec2,
    /// Current facing in degrees.
    pub facing: f64,
    /// Body radius in pixels.
    pub radius: f64,
    /// What to draw for the active weapon.
    pub weapon_render_state: WeaponRenderState,
    /// Health as a fraction of maximum, in [0, 1].
    pub health_fraction: f64,
    /// Faction id.
    pub faction: FactionId,
    /// Player-selection flag.
    pub selected: bool,
    /// Target zone, if defined.
    pub target_zone: Option<TargetZone>,
    /// Current combat target, if any.
    pub current_target: Option<UnitId>,
}

/// Whole-field render view taken at a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Whether the clock is paused.
    pub paused: bool,
    /// Units in ascending id order.
    pub units: Vec<UnitSnapshot>,
}

/// Detailed character stats view, produced on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Display name.
    pub name: String,
    /// Archetype label.
    pub archetype: String,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Base attributes.
    pub stats: crate::stats::Stats,
    /// Skill levels.
    pub skills: crate::stats::SkillSet,
    /// Wounds received.
    pub wounds: Vec<Wound>,
    /// Display name of the active weapon.
    pub active_weapon: String,
    /// Display name of the holstered/stowed other weapon, if any.
    pub stowed_weapon: Option<String>,
    /// Active combat mode.
    pub combat_mode: CombatMode,
    /// Hold-state preference.
    pub hold_state: String,
    /// Movement gait.
    pub movement_type: MovementType,
    /// Aiming deliberateness.
    pub aiming_speed: AimingSpeed,
    /// Selected firing mode, for ranged carriers.
    pub firing_mode: Option<FiringMode>,
    /// Rounds left in the magazine, for ranged carriers.
    pub ammo: Option<u32>,
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
    /// Out of the fight.
    pub incapacitated: bool,
}

impl GameState {
    /// Take a render snapshot of the whole field.
    #[must_use]
    pub fn snapshot(&self) -> FieldSnapshot {
        let units = self
            .units
            .sorted_ids()
            .into_iter()
            .filter_map(|id| {
                let unit = self.units.get(id)?;
                let character = &unit.character;
                Some(UnitSnapshot {
                    id,
                    position: unit.position,
                    facing: unit.facing,
                    radius: unit.radius,
                    weapon_render_state: render_state(character.active_weapon_state()),
                    health_fraction: if character.max_health > 0 {
                        f64::from(character.health) / f64::from(character.max_health)
                    } else {
                        0.0
                    },
                    faction: character.faction,
                    selected: unit.selected,
                    target_zone: character.target_zone,
                    current_target: character.target,
                })
            })
            .collect();
        FieldSnapshot {
            tick: self.tick,
            paused: self.paused,
            units,
        }
    }

    /// Produce a detailed stats sheet for one unit.
    #[must_use]
    pub fn character_sheet(&self, id: UnitId) -> Option<CharacterSheet> {
        let unit = self.units.get(id)?;
        let character = &unit.character;

        let weapon_name = |wid: &str| {
            self.weapons
                .get(wid)
                .map_or_else(|| wid.to_string(), |w| w.common().name.clone())
        };
        let melee_name = weapon_name(&character.melee.weapon);
        let ranged_name = character.ranged.as_ref().map(|c| weapon_name(&c.weapon));

        let (active_weapon, stowed_weapon) = match character.effective_mode() {
            CombatMode::Ranged => (
                ranged_name.clone().unwrap_or_else(|| melee_name.clone()),
                Some(melee_name.clone()),
            ),
            CombatMode::Melee => (melee_name.clone(), ranged_name.clone()),
        };

        Some(CharacterSheet {
            name: character.name.clone(),
            archetype: character.archetype.clone(),
            health: character.health,
            max_health: character.max_health,
            stats: character.stats,
            skills: character.skills.clone(),
            wounds: character.wounds.clone(),
            active_weapon,
            stowed_weapon,
            combat_mode: character.combat_mode,
            hold_state: character.hold_state.clone(),
            movement_type: character.movement_type,
            aiming_speed: character.aiming_speed,
            firing_mode: character.ranged.as_ref().map(|c| c.firing_mode),
            ammo: character.ranged.as_ref().map(|c| c.ammo),
            ranged_tally: character.ranged_tally,
            melee_tally: character.melee_tally,
            wound_hesitation: character.wound_hesitation,
            bravery_hesitation: character.bravery_hesitation,
            defense_state: character.defense_state,
            incapacitated: character.incapacitated,
        })
    }
}
