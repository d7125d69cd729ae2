//! Audio/visual hooks consumed from external collaborators.
//!
//! The core invokes these at the moment a weapon fires or a swing
//! starts. They are strictly best-effort: the default implementations do
//! nothing but log, so a missing collaborator can never crash a tick.

use crate::units::UnitId;

/// Default muzzle-flash duration handed to the renderer, in ticks.
pub const MUZZLE_FLASH_TICKS: u32 = 30;

/// External audio/visual callbacks.
///
/// Implementors override what they support; everything defaults to a
/// logged no-op.
pub trait CombatHooks {
    /// A weapon fired or swung. `weapon_name` is the display name.
    fn play_weapon_sound(&mut self, weapon_name: &str) {
        tracing::debug!(weapon = weapon_name, "no audio sink attached; weapon sound dropped");
    }

    /// A ranged weapon discharged from `unit`; show a flash for
    /// `duration_ticks`.
    fn add_muzzle_flash(&mut self, unit: UnitId, duration_ticks: u32) {
        tracing::debug!(unit, duration_ticks, "no renderer attached; muzzle flash dropped");
    }
}

/// Hook sink used when no external collaborator is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl CombatHooks for NullHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_hooks_are_callable() {
        let mut hooks = NullHooks;
        hooks.play_weapon_sound("Test Pistol");
        hooks.add_muzzle_flash(1, MUZZLE_FLASH_TICKS);
    }

    #[test]
    fn test_partial_implementations_compile() {
        struct SoundOnly {
            played: Vec<String>,
        }
        impl CombatHooks for SoundOnly {
            fn play_weapon_sound(&mut self, weapon_name: &str) {
                self.played.push(weapon_name.to_string());
            }
        }
        let mut hooks = SoundOnly { played: Vec::new() };
        hooks.play_weapon_sound("Colt Peacemaker");
        hooks.add_muzzle_flash(3, 30);
        assert_eq!(hooks.played, vec!["Colt Peacemaker"]);
    }
}
