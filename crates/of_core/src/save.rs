//! Save-game capture and restore.
//!
//! `SaveGame` is the persisted form of a [`GameState`]: only durable
//! fields are written. Weapon machine states, hold states, combat mode,
//! and in-flight events are intentionally not persisted; on restore the
//! weapons reset to their default states, combat mode resets to ranged,
//! hold state resets to "aiming", and normal tick processing re-schedules
//! whatever needs to happen. Because capture already excludes the
//! transient fields, capture-restore-capture is byte-identical.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::character::{
    AimingSpeed, CarriedMelee, CarriedRanged, Character, CombatTally, DefenseState, Handedness,
    MovementType, TargetZone, DEFAULT_HOLD_STATE,
};
use crate::error::{CoreError, Result};
use crate::factions::{AlignmentTable, FactionId};
use crate::game_state::{GameConfig, GameState};
use crate::math::Vec2;
use crate::rng::CombatRng;
use crate::stats::{SkillSet, Stats};
use crate::units::{Unit, UnitId, UnitRoster};
use crate::weapons::{FiringMode, Weapon, WeaponId};
use crate::wounds::Wound;

/// Save format version for compatibility checks.
pub const SAVE_VERSION: u32 = 1;

/// Persisted ranged-weapon slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRanged {
    /// Weapon definition id.
    pub weapon: WeaponId,
    /// Rounds remaining.
    pub ammo: u32,
    /// Selected firing mode.
    pub firing_mode: FiringMode,
}

/// Persisted character fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCharacter {
    /// Display name.
    pub name: String,
    /// Faction id.
    pub faction: FactionId,
    /// Base attributes.
    pub stats: Stats,
    /// Archetype label.
    pub archetype: String,
    /// Hand preference.
    pub handedness: Handedness,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Wounds received.
    pub wounds: Vec<Wound>,
    /// Skill levels.
    pub skills: SkillSet,
    /// Ranged slot, if carried.
    pub ranged: Option<SavedRanged>,
    /// Melee weapon id.
    pub melee_weapon: WeaponId,
    /// Movement gait.
    pub movement_type: MovementType,
    /// Aiming deliberateness.
    pub aiming_speed: AimingSpeed,
    /// Current combat target.
    pub target: Option<UnitId>,
    /// Target zone rectangle.
    pub target_zone: Option<TargetZone>,
    /// Auto-targeting flag.
    pub auto_target: bool,
    /// Persistent-attack flag.
    pub persistent_attack: bool,
    /// Ranged statistics.
    pub ranged_tally: CombatTally,
    /// Melee statistics.
    pub melee_tally: CombatTally,
    /// Wound hesitation remaining.
    pub wound_hesitation: u32,
    /// Bravery hesitation remaining.
    pub bravery_hesitation: u32,
    /// Defense readiness.
    pub defense_state: DefenseState,
    /// Tick the defense cooldown ends.
    pub defense_cooldown_end: u64,
    /// Tick melee recovery ends.
    pub melee_recovery_end: u64,
    /// Out of the fight.
    pub incapacitated: bool,
}

/// Persisted unit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedUnit {
    /// Unit id.
    pub id: UnitId,
    /// World position.
    pub position: Vec2,
    /// Current facing in degrees.
    pub facing: f64,
    /// Selection flag.
    pub selected: bool,
    /// Persisted character fields.
    pub character: SavedCharacter,
}

/// A complete persisted game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    /// Save format version.
    pub version: u32,
    /// RNG seed the game was created with.
    pub seed: u64,
    /// Tick at capture time.
    pub tick: u64,
    /// Pause flag.
    pub paused: bool,
    /// Edit-mode flag.
    pub edit_mode: bool,
    /// Behavior switches.
    pub config: GameConfig,
    /// Faction alignment table.
    pub alignment: AlignmentTable,
    /// Exact RNG stream position.
    pub rng: CombatRng,
    /// Weapon definitions, sorted by id.
    pub weapons: Vec<Weapon>,
    /// Units, sorted by id.
    pub units: Vec<SavedUnit>,
}

impl SaveGame {
    /// Capture the persisted form of a game state.
    #[must_use]
    pub fn capture(gs: &GameState) -> Self {
        let mut weapons: Vec<Weapon> = gs.weapons.values().cloned().collect();
        weapons.sort_by(|a, b| a.common().id.cmp(&b.common().id));

        let units = gs
            .units
            .sorted_ids()
            .into_iter()
            .filter_map(|id| {
                let unit = gs.units.get(id)?;
                let c = &unit.character;
                Some(SavedUnit {
                    id,
                    position: unit.position,
                    facing: unit.facing,
                    selected: unit.selected,
                    character: SavedCharacter {
                        name: c.name.clone(),
                        faction: c.faction,
                        stats: c.stats,
                        archetype: c.archetype.clone(),
                        handedness: c.handedness,
                        health: c.health,
                        max_health: c.max_health,
                        wounds: c.wounds.clone(),
                        skills: c.skills.clone(),
                        ranged: c.ranged.as_ref().map(|r| SavedRanged {
                            weapon: r.weapon.clone(),
                            ammo: r.ammo,
                            firing_mode: r.firing_mode,
                        }),
                        melee_weapon: c.melee.weapon.clone(),
                        movement_type: c.movement_type,
                        aiming_speed: c.aiming_speed,
                        target: c.target,
                        target_zone: c.target_zone,
                        auto_target: c.auto_target,
                        persistent_attack: c.persistent_attack,
                        ranged_tally: c.ranged_tally,
                        melee_tally: c.melee_tally,
                        wound_hesitation: c.wound_hesitation,
                        bravery_hesitation: c.bravery_hesitation,
                        defense_state: c.defense_state,
                        defense_cooldown_end: c.defense_cooldown_end,
                        melee_recovery_end: c.melee_recovery_end,
                        incapacitated: c.incapacitated,
                    },
                })
            })
            .collect();

        Self {
            version: SAVE_VERSION,
            seed: gs.seed(),
            tick: gs.current_tick(),
            paused: gs.is_paused(),
            edit_mode: gs.edit_mode(),
            config: gs.config,
            alignment: gs.alignment.clone(),
            rng: gs.rng.clone(),
            weapons,
            units,
        }
    }

    /// Rebuild a game state from the persisted form.
    ///
    /// Transient fields come back at their documented defaults: weapon
    /// states reset to each weapon's default, combat mode to ranged,
    /// hold state to "aiming", no attack in progress, empty event queue.
    pub fn restore(&self) -> Result<GameState> {
        if self.version != SAVE_VERSION {
            return Err(CoreError::InvalidState(format!(
                "save version mismatch: expected {SAVE_VERSION}, got {}",
                self.version
            )));
        }

        let mut gs = GameState::with_config(self.seed, self.config);
        gs.alignment = self.alignment.clone();
        for weapon in &self.weapons {
            gs.add_weapon(weapon.clone())?;
        }

        let mut roster = UnitRoster::new();
        for saved in &self.units {
            let sc = &saved.character;
            let ranged = match &sc.ranged {
                Some(r) => {
                    let weapon = gs
                        .weapon(&r.weapon)
                        .ok_or_else(|| CoreError::WeaponNotFound(r.weapon.clone()))?;
                    Some(CarriedRanged {
                        weapon: r.weapon.clone(),
                        state: weapon.default_state().to_string(),
                        ammo: r.ammo,
                        firing_mode: r.firing_mode,
                        burst_fired: 0,
                    })
                }
                None => None,
            };
            let melee_weapon = gs
                .weapon(&sc.melee_weapon)
                .ok_or_else(|| CoreError::WeaponNotFound(sc.melee_weapon.clone()))?;
            let melee = CarriedMelee {
                weapon: sc.melee_weapon.clone(),
                state: melee_weapon.default_state().to_string(),
            };

            let mut character =
                Character::new(sc.name.clone(), sc.faction, sc.stats, sc.max_health, ranged, melee);
            character.archetype = sc.archetype.clone();
            character.handedness = sc.handedness;
            character.health = sc.health;
            character.wounds = sc.wounds.clone();
            character.skills = sc.skills.clone();
            character.movement_type = sc.movement_type;
            character.aiming_speed = sc.aiming_speed;
            character.target = sc.target;
            character.target_zone = sc.target_zone;
            character.auto_target = sc.auto_target;
            character.persistent_attack = sc.persistent_attack;
            character.hold_state = DEFAULT_HOLD_STATE.to_string();
            character.ranged_tally = sc.ranged_tally;
            character.melee_tally = sc.melee_tally;
            character.wound_hesitation = sc.wound_hesitation;
            character.bravery_hesitation = sc.bravery_hesitation;
            character.defense_state = sc.defense_state;
            character.defense_cooldown_end = sc.defense_cooldown_end;
            character.melee_recovery_end = sc.melee_recovery_end;
            character.incapacitated = sc.incapacitated;

            let mut unit = Unit::new(saved.id, saved.position, saved.facing, character);
            unit.selected = saved.selected;
            roster.restore(unit);
        }

        gs.units = roster;
        gs.rng = self.rng.clone();
        gs.tick = self.tick;
        gs.paused = self.paused;
        gs.edit_mode = self.edit_mode;
        Ok(gs)
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CoreError::InvalidState(format!("failed to serialize save: {e}")))
    }

    /// Deserialize from bytes, checking the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let save: Self = bincode::deserialize(bytes)
            .map_err(|e| CoreError::InvalidState(format!("failed to deserialize save: {e}")))?;
        if save.version != SAVE_VERSION {
            return Err(CoreError::InvalidState(format!(
                "save version mismatch: expected {SAVE_VERSION}, got {}",
                save.version
            )));
        }
        Ok(save)
    }

    /// Write the save to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| CoreError::InvalidState(format!("failed to write save file: {e}")))
    }

    /// Read a save from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| CoreError::InvalidState(format!("failed to read save file: {e}")))?;
        Self::from_bytes(&bytes)
    }
}
