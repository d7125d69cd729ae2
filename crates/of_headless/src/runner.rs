//! Drives a scenario through the combat core tick by tick.

use std::collections::BTreeMap;

use of_core::factions::FactionId;
use of_core::game_state::GameState;
use of_core::units::UnitId;

use crate::scenario::Scenario;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The tick budget ran out.
    TickBudget,
    /// At most one faction still has conscious units.
    Decided,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Ticks actually simulated.
    pub ticks_run: u64,
    /// Why the run stopped.
    pub stop_reason: StopReason,
    /// Conscious units per faction at the end.
    pub standing: BTreeMap<FactionId, u32>,
    /// Units incapacitated during the run, in order of falling.
    pub fallen: Vec<UnitId>,
    /// Combat log lines accumulated during the run.
    pub log: Vec<String>,
}

impl RunOutcome {
    /// The surviving faction, if the fight was decided.
    #[must_use]
    pub fn winner(&self) -> Option<FactionId> {
        let mut alive = self.standing.iter().filter(|(_, &count)| count > 0);
        match (alive.next(), alive.next()) {
            (Some((&faction, _)), None) => Some(faction),
            _ => None,
        }
    }
}

/// Run a scenario to completion.
///
/// Scripted commands apply at their tick boundary; rejected commands
/// are logged and skipped, matching how a UI layer would treat them.
pub fn run_scenario(scenario: &Scenario, gs: &mut GameState) -> RunOutcome {
    let mut commands: Vec<_> = scenario.commands.clone();
    commands.sort_by_key(|c| c.tick);
    let mut next_command = 0;

    let mut fallen = Vec::new();
    let mut log = Vec::new();
    let mut ticks_run = 0;
    let mut stop_reason = StopReason::TickBudget;

    for _ in 0..scenario.ticks {
        let tick = gs.current_tick();
        while next_command < commands.len() && commands[next_command].tick <= tick {
            let scripted = &commands[next_command];
            if let Err(err) = gs.apply_command(scripted.command.clone()) {
                tracing::warn!(tick, %err, "scripted command rejected");
            }
            next_command += 1;
        }

        let events = gs.tick();
        ticks_run += 1;
        for message in &events.messages {
            tracing::info!(tick, "{message}");
        }
        log.extend(events.messages);
        fallen.extend(events.incapacitations);

        if factions_standing(gs) <= 1 {
            stop_reason = StopReason::Decided;
            break;
        }
    }

    RunOutcome {
        ticks_run,
        stop_reason,
        standing: standing_by_faction(gs),
        fallen,
        log,
    }
}

fn standing_by_faction(gs: &GameState) -> BTreeMap<FactionId, u32> {
    let mut standing = BTreeMap::new();
    for id in gs.units.sorted_ids() {
        if let Some(unit) = gs.units.get(id) {
            let count = standing.entry(unit.character.faction).or_insert(0);
            if !unit.character.incapacitated {
                *count += 1;
            }
        }
    }
    standing
}

fn factions_standing(gs: &GameState) -> usize {
    standing_by_faction(gs)
        .values()
        .filter(|&&count| count > 0)
        .count()
}
