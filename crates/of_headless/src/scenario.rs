//! Scenario loading and configuration.
//!
//! A scenario is a RON file naming the JSON data files to load, the RNG
//! seed, a tick budget, and an optional command script. Data file paths
//! resolve relative to the scenario file; when they are absent the
//! built-in skirmish data is used, so the runner works with no files at
//! all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use of_core::commands::Command;
use of_core::data;
use of_core::error::CoreError;
use of_core::game_state::{GameConfig, GameState};
use of_core::units::UnitId;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read a file.
    #[error("Failed to read scenario data: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The core rejected loaded data.
    #[error(transparent)]
    DataError(#[from] CoreError),
}

/// A command scheduled for a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedCommand {
    /// Tick before which the command is applied.
    pub tick: u64,
    /// The command itself.
    pub command: Command,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// RNG seed; overridable from the command line.
    pub seed: u64,
    /// Tick budget for the run.
    pub ticks: u64,
    /// Treat target zones as hard filters.
    #[serde(default)]
    pub strict_zones: bool,
    /// Enable melee counter-attacks.
    #[serde(default)]
    pub counter_attacks: bool,
    /// Weapon data file (JSON), relative to the scenario file.
    #[serde(default)]
    pub weapons_file: Option<PathBuf>,
    /// Character data file (JSON), relative to the scenario file.
    #[serde(default)]
    pub characters_file: Option<PathBuf>,
    /// Faction alignment overrides file (JSON).
    #[serde(default)]
    pub alignment_file: Option<PathBuf>,
    /// Commands applied at tick boundaries during the run.
    #[serde(default)]
    pub commands: Vec<ScriptedCommand>,
}

/// Built-in weapon data used when a scenario names no weapons file.
const DEFAULT_WEAPONS_JSON: &str = r#"[
    {
        "type": "ranged",
        "id": "colt_peacemaker",
        "name": "Colt Peacemaker",
        "damage": 6,
        "accuracy": 15,
        "wound_noun": "bullet",
        "kind": "revolver",
        "length_feet": 1.0,
        "max_range_feet": 210.0,
        "velocity_fps": 900.0,
        "ammo_capacity": 6,
        "firing_delay": 8,
        "reload_ticks": 120,
        "combat_skill": "pistol",
        "states": [
            {"name": "holstered", "next": "grippinginholster", "ticks": 15},
            {"name": "grippinginholster", "next": "drawing", "ticks": 15},
            {"name": "drawing", "next": "ready", "ticks": 30},
            {"name": "ready", "next": "aiming", "ticks": 30},
            {"name": "aiming", "next": "firing", "ticks": 15},
            {"name": "firing", "next": "recovering", "ticks": 5},
            {"name": "recovering", "next": "aiming", "ticks": 30},
            {"name": "reloading", "next": "ready", "ticks": 120}
        ],
        "initial_state": "holstered"
    },
    {
        "type": "melee",
        "id": "unarmed",
        "name": "Unarmed",
        "damage": 2,
        "wound_noun": "blow",
        "kind": "unarmed",
        "reach_feet": 0.5,
        "attack_speed": 30,
        "attack_cooldown": 45,
        "defend_score": 20,
        "combat_skill": "brawling",
        "states": [
            {"name": "melee_ready", "next": "melee_attacking", "ticks": 0},
            {"name": "melee_attacking", "next": "melee_ready", "ticks": 30}
        ],
        "initial_state": "melee_ready"
    }
]"#;

/// Built-in character data used when a scenario names no characters file.
const DEFAULT_CHARACTERS_JSON: &str = r#"[
    {
        "name": "Ringo",
        "faction": 1,
        "archetype": "gunslinger",
        "stats": {"dexterity": 77, "strength": 35, "reflexes": 54, "coolness": 82, "health": 87},
        "health": 87,
        "skills": {"pistol": 3},
        "ranged_weapon": "colt_peacemaker",
        "position": {"x": 0.0, "y": 0.0},
        "facing": 180.0
    },
    {
        "name": "Doc",
        "faction": 2,
        "archetype": "gunslinger",
        "stats": {"dexterity": 77, "strength": 35, "reflexes": 54, "coolness": 82, "health": 87},
        "health": 87,
        "ranged_weapon": "colt_peacemaker",
        "position": {"x": 70.0, "y": 0.0},
        "facing": 0.0
    }
]"#;

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Default Skirmish".to_string(),
            description: "Two revolver duelists ten feet apart".to_string(),
            seed: 42,
            ticks: 600,
            strict_zones: false,
            counter_attacks: false,
            weapons_file: None,
            characters_file: None,
            alignment_file: None,
            commands: vec![
                ScriptedCommand {
                    tick: 0,
                    command: Command::ToggleAutoTarget { unit: 1 },
                },
                ScriptedCommand {
                    tick: 0,
                    command: Command::ToggleAutoTarget { unit: 2 },
                },
            ],
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, PathBuf), ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Self = ron::from_str(&contents)?;
        let base = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok((scenario, base))
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(text)?)
    }

    /// Build the initial game state this scenario describes.
    ///
    /// Data files resolve relative to `base_dir`; absent files fall
    /// back to the built-in skirmish data. Returns the state and the
    /// spawned unit ids in character-record order.
    pub fn build(&self, base_dir: &Path) -> Result<(GameState, Vec<UnitId>), ScenarioError> {
        let weapons_json = self.read_or_default(base_dir, &self.weapons_file, DEFAULT_WEAPONS_JSON)?;
        let characters_json =
            self.read_or_default(base_dir, &self.characters_file, DEFAULT_CHARACTERS_JSON)?;

        let config = GameConfig {
            strict_zones: self.strict_zones,
            counter_attacks: self.counter_attacks,
        };
        let mut gs = GameState::with_config(self.seed, config);

        for weapon in data::load_weapons(&weapons_json)? {
            gs.add_weapon(weapon)?;
        }
        if let Some(alignment_file) = &self.alignment_file {
            let json = std::fs::read_to_string(base_dir.join(alignment_file))?;
            gs.alignment = data::load_alignment(&json)?;
        }

        let mut spawned = Vec::new();
        for record in data::load_characters(&characters_json)? {
            let position = record.position;
            let facing = record.facing;
            let character = record.into_character(|weapon_id| {
                gs.weapon(weapon_id).map_or(0, |w| match w {
                    of_core::weapons::Weapon::Ranged(r) => r.ammo_capacity,
                    of_core::weapons::Weapon::Melee(_) => 0,
                })
            });
            spawned.push(gs.spawn_unit(character, position, facing)?);
        }
        Ok((gs, spawned))
    }

    fn read_or_default(
        &self,
        base_dir: &Path,
        file: &Option<PathBuf>,
        fallback: &str,
    ) -> Result<String, ScenarioError> {
        match file {
            Some(path) => Ok(std::fs::read_to_string(base_dir.join(path))?),
            None => Ok(fallback.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        let (gs, spawned) = scenario.build(Path::new(".")).unwrap();
        assert_eq!(spawned, vec![1, 2]);
        assert_eq!(gs.units.len(), 2);
        assert!(gs.weapon("colt_peacemaker").is_some());
        assert!(gs.weapon("unarmed").is_some());
    }

    #[test]
    fn test_scenario_ron_round_trip() {
        let ron_text = r#"(
            name: "Zone Drill",
            description: "Zone preference exercise",
            seed: 7,
            ticks: 300,
            commands: [
                (tick: 0, command: ToggleAutoTarget(unit: 1)),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron_text).unwrap();
        assert_eq!(scenario.name, "Zone Drill");
        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.commands.len(), 1);
        assert!(scenario.weapons_file.is_none());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = Scenario::load("no/such/scenario.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }
}
