//! Determinism testing utilities.
//!
//! The combat core promises seed-exact reproducibility: the same seed,
//! scenario, and command sequence must produce identical states
//! tick-for-tick. Sources of non-determinism this harness exists to
//! catch:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   All per-tick iteration must go through sorted unit ids.
//! - **Unseeded randomness**: every draw must flow through the single
//!   seeded PRNG, in tick order.
//! - **Queue ordering**: same-tick events must fire in insertion order.

use std::thread;

use of_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All unique hashes (should be exactly 1).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the runs matched, with a detailed message otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario `runs` times for `ticks` ticks and compare hashes.
pub fn verify_determinism<Setup>(runs: usize, ticks: u64, setup: Setup) -> DeterminismResult
where
    Setup: Fn() -> GameState,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut gs = setup();
        for _ in 0..ticks {
            gs.tick();
        }
        hashes.push(gs.state_hash());
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Find the first tick at which two identically-set-up runs diverge.
///
/// Returns `None` for a deterministic scenario.
pub fn find_first_divergence<Setup>(setup: Setup, ticks: u64) -> Option<u64>
where
    Setup: Fn() -> GameState,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for tick in 1..=ticks {
        a.tick();
        b.tick();
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Run N copies of a scenario on separate threads and compare results.
///
/// Catches non-determinism that only shows up under scheduling or
/// memory-layout variation.
pub fn run_parallel_simulations<Setup>(
    setup: Setup,
    num_sims: usize,
    ticks: u64,
) -> DeterminismResult
where
    Setup: Fn() -> GameState + Sync,
{
    let hashes = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                scope.spawn(|| {
                    let mut gs = setup();
                    for _ in 0..ticks {
                        gs.tick();
                    }
                    gs.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect::<Vec<_>>()
    });
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Verify the save round-trip property: capture, restore, capture again,
/// and the two captures serialize to identical bytes.
pub fn verify_save_roundtrip(gs: &GameState) -> bool {
    let first = SaveGame::capture(gs);
    let Ok(bytes) = first.to_bytes() else {
        return false;
    };
    let Ok(parsed) = SaveGame::from_bytes(&bytes) else {
        return false;
    };
    let Ok(restored) = parsed.restore() else {
        return false;
    };
    let second = SaveGame::capture(&restored);
    match second.to_bytes() {
        Ok(second_bytes) => second_bytes == bytes,
        Err(_) => false,
    }
}

/// Proptest strategies for scenario generation.
pub mod strategies {
    use proptest::prelude::*;

    use of_core::prelude::Vec2;

    /// World positions inside a typical field.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// RNG seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Stat values in the legal range.
    pub fn arb_stat() -> impl Strategy<Value = u8> {
        1u8..=100
    }

    /// Skill levels in the legal range.
    pub fn arb_skill() -> impl Strategy<Value = u8> {
        0u8..=9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn duel(seed: u64) -> GameState {
        let mut gs = fixtures::armed_state(seed);
        let a = fixtures::spawn_gunslinger(&mut gs, 1, Vec2::ZERO, 3);
        let b = fixtures::spawn_gunslinger(&mut gs, 2, Vec2::new(0.0, -70.0), 0);
        gs.apply_command(Command::ToggleAutoTarget { unit: a }).unwrap();
        gs.apply_command(Command::ToggleAutoTarget { unit: b }).unwrap();
        gs
    }

    #[test]
    fn test_duel_determinism() {
        verify_determinism(3, 400, || duel(42)).assert_deterministic();
    }

    #[test]
    fn test_no_divergence_in_duel() {
        assert_eq!(find_first_divergence(|| duel(7), 300), None);
    }

    #[test]
    fn test_parallel_duels_match() {
        run_parallel_simulations(|| duel(99), 4, 300).assert_deterministic();
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = duel(1);
        let mut b = duel(2);
        for _ in 0..400 {
            a.tick();
            b.tick();
        }
        // Facing, rolls, and outcomes all flow from the seed; two seeds
        // matching after a whole firefight would mean the RNG is unused.
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_save_roundtrip_mid_fight() {
        let mut gs = duel(42);
        for _ in 0..200 {
            gs.tick();
        }
        assert!(verify_save_roundtrip(&gs));
    }
}
