//! Faction alignment record schema.

use serde::{Deserialize, Serialize};

use crate::factions::{Alignment, FactionId};

/// One alignment override between a pair of factions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlignmentRecord {
    /// First faction.
    pub a: FactionId,
    /// Second faction.
    pub b: FactionId,
    /// Declared relationship.
    pub alignment: Alignment,
}
