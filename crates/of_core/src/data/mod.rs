//! Data-driven definitions loaded from JSON.
//!
//! These records carry only the semantic fields the core reads; the
//! on-disk layout and theming around them belong to the outer loader.
//! Absent fields take the documented defaults (melee weapon "Unarmed",
//! wound noun "projectile", defense cooldown 60, firing modes [Single]).
//! Invalid records fail the load fast with a diagnostic naming the
//! offending record; there is no partial-load recovery.

mod character_data;
mod faction_data;
mod weapon_data;

pub use character_data::{CharacterRecord, StatsRecord};
pub use faction_data::AlignmentRecord;
pub use weapon_data::{MeleeRecord, RangedRecord, StateRecord, WeaponRecord};

use crate::error::{CoreError, Result};
use crate::factions::AlignmentTable;
use crate::weapons::Weapon;

/// Parse and validate a JSON array of weapon records.
pub fn load_weapons(json: &str) -> Result<Vec<Weapon>> {
    let records: Vec<WeaponRecord> =
        serde_json::from_str(json).map_err(|e| CoreError::ParseError(e.to_string()))?;
    let mut weapons = Vec::with_capacity(records.len());
    for record in records {
        let weapon = record.into_weapon();
        weapon.validate()?;
        weapons.push(weapon);
    }
    Ok(weapons)
}

/// Parse a JSON array of character records.
///
/// Range validation happens when the characters are spawned into a
/// [`crate::game_state::GameState`], where weapon references resolve.
pub fn load_characters(json: &str) -> Result<Vec<CharacterRecord>> {
    serde_json::from_str(json).map_err(|e| CoreError::ParseError(e.to_string()))
}

/// Parse a JSON array of alignment overrides into a table.
pub fn load_alignment(json: &str) -> Result<AlignmentTable> {
    let records: Vec<AlignmentRecord> =
        serde_json::from_str(json).map_err(|e| CoreError::ParseError(e.to_string()))?;
    let mut table = AlignmentTable::new();
    for record in records {
        table.set(record.a, record.b, record.alignment);
    }
    Ok(table)
}
