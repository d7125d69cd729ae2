//! The scheduled-event queue.
//!
//! Deferred side effects (weapon state transitions, in-flight impacts)
//! are events keyed by `(tick, sequence)`. The sequence number increases
//! monotonically with every insertion, giving events scheduled for the
//! same tick a total, deterministic order.
//!
//! Events are cancelled by owning unit and kind filter, never by handle.
//! Cancelling events that do not exist is a silent no-op.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::CombatMode;
use crate::units::UnitId;

/// The deferred action an event performs when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Advance the owner's weapon of the given mode to its next state.
    StateAdvance {
        /// Which carried weapon the transition belongs to.
        mode: CombatMode,
    },
    /// A ranged shot arrives. Rolls are drawn when the shot is scheduled
    /// so the RNG stream does not depend on queue interleaving.
    RangedImpact {
        /// Unit the shot was fired at.
        target: UnitId,
        /// Pre-drawn attack roll in [1, 100].
        attack_roll: u8,
        /// Pre-drawn hit-location roll in [1, 100].
        location_roll: u8,
        /// Zero-based index of this shot within the current burst.
        burst_index: u8,
    },
    /// A melee swing lands (or whiffs).
    MeleeImpact {
        /// Unit being struck.
        target: UnitId,
        /// Pre-drawn attack roll in [1, 100].
        attack_roll: u8,
        /// Pre-drawn hit-location roll in [1, 100].
        location_roll: u8,
        /// Counter-attacks bypass the defender's defensive roll.
        counter: bool,
    },
}

impl EventKind {
    /// The unit this event is aimed at, if it is an attack.
    #[must_use]
    pub const fn attack_target(&self) -> Option<UnitId> {
        match self {
            Self::RangedImpact { target, .. } | Self::MeleeImpact { target, .. } => Some(*target),
            Self::StateAdvance { .. } => None,
        }
    }
}

/// Filter for owner-scoped cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Every event the owner has scheduled.
    Any,
    /// Pending impacts (ranged and melee).
    Attacks,
    /// Pending impacts against one specific unit.
    AttacksAgainst(UnitId),
    /// Pending weapon state transitions (both modes).
    StateAdvances,
}

impl EventFilter {
    fn matches(self, kind: &EventKind) -> bool {
        match self {
            Self::Any => true,
            Self::Attacks => kind.attack_target().is_some(),
            Self::AttacksAgainst(unit) => kind.attack_target() == Some(unit),
            Self::StateAdvances => matches!(kind, EventKind::StateAdvance { .. }),
        }
    }
}

/// A pending side effect owned by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Absolute tick the event fires on.
    pub tick: u64,
    /// Insertion sequence number; total order among same-tick events.
    pub seq: u64,
    /// Unit whose combat intent created the event.
    pub owner: UnitId,
    /// What happens when it fires.
    pub kind: EventKind,
}

/// Priority queue of [`ScheduledEvent`]s ordered by `(tick, seq)`.
///
/// A `BTreeMap` keeps ordering deterministic and makes owner-scoped
/// cancellation a simple linear retain; queue size is bounded by a few
/// events per active unit, so the scan cost is negligible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    events: BTreeMap<(u64, u64), ScheduledEvent>,
    next_seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event, assigning it the next sequence number.
    pub fn schedule(&mut self, tick: u64, owner: UnitId, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.insert(
            (tick, seq),
            ScheduledEvent {
                tick,
                seq,
                owner,
                kind,
            },
        );
    }

    /// Pop the earliest event due at or before `tick`, if any.
    ///
    /// Popping one at a time lets an event handler schedule a same-tick
    /// follow-up and still have it processed in this drain pass.
    pub fn pop_due(&mut self, tick: u64) -> Option<ScheduledEvent> {
        let key = *self.events.keys().next()?;
        if key.0 > tick {
            return None;
        }
        self.events.remove(&key)
    }

    /// Remove all of `owner`'s events matching `filter`.
    ///
    /// Returns how many were removed; removing nothing is not an error.
    pub fn cancel_owned(&mut self, owner: UnitId, filter: EventFilter) -> usize {
        let before = self.events.len();
        self.events
            .retain(|_, evt| evt.owner != owner || !filter.matches(&evt.kind));
        before - self.events.len()
    }

    /// Whether `owner` has a pending event matching `filter`.
    #[must_use]
    pub fn has_pending(&self, owner: UnitId, filter: EventFilter) -> bool {
        self.events
            .values()
            .any(|evt| evt.owner == owner && filter.matches(&evt.kind))
    }

    /// Whether `owner` has a pending state transition for `mode`.
    #[must_use]
    pub fn has_pending_advance(&self, owner: UnitId, mode: CombatMode) -> bool {
        self.events.values().any(|evt| {
            evt.owner == owner && evt.kind == EventKind::StateAdvance { mode }
        })
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest scheduled tick, if any event is pending.
    #[must_use]
    pub fn next_tick(&self) -> Option<u64> {
        self.events.keys().next().map(|&(tick, _)| tick)
    }

    /// Iterate pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(mode: CombatMode) -> EventKind {
        EventKind::StateAdvance { mode }
    }

    fn impact(target: UnitId) -> EventKind {
        EventKind::RangedImpact {
            target,
            attack_roll: 50,
            location_roll: 50,
            burst_index: 0,
        }
    }

    #[test]
    fn test_same_tick_fires_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.schedule(10, 1, impact(2));
        queue.schedule(10, 2, impact(1));
        queue.schedule(5, 3, advance(CombatMode::Ranged));

        let first = queue.pop_due(10).unwrap();
        assert_eq!(first.owner, 3);
        let second = queue.pop_due(10).unwrap();
        assert_eq!(second.owner, 1);
        let third = queue.pop_due(10).unwrap();
        assert_eq!(third.owner, 2);
        assert!(queue.pop_due(10).is_none());
    }

    #[test]
    fn test_not_due_stays_queued() {
        let mut queue = EventQueue::new();
        queue.schedule(20, 1, impact(2));
        assert!(queue.pop_due(19).is_none());
        assert_eq!(queue.len(), 1);
        assert!(queue.pop_due(20).is_some());
    }

    #[test]
    fn test_cancel_by_owner_and_kind() {
        let mut queue = EventQueue::new();
        queue.schedule(10, 1, impact(2));
        queue.schedule(11, 1, advance(CombatMode::Ranged));
        queue.schedule(12, 2, impact(1));

        assert_eq!(queue.cancel_owned(1, EventFilter::Attacks), 1);
        assert_eq!(queue.len(), 2);
        assert!(queue.has_pending_advance(1, CombatMode::Ranged));
        assert!(queue.has_pending(2, EventFilter::Attacks));
    }

    #[test]
    fn test_cancel_attacks_against_specific_target() {
        let mut queue = EventQueue::new();
        queue.schedule(10, 1, impact(2));
        queue.schedule(10, 1, impact(3));
        assert_eq!(queue.cancel_owned(1, EventFilter::AttacksAgainst(2)), 1);
        assert!(queue.has_pending(1, EventFilter::AttacksAgainst(3)));
    }

    #[test]
    fn test_cancel_missing_is_noop() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.cancel_owned(9, EventFilter::Any), 0);
    }

    #[test]
    fn test_sequence_survives_cancellation() {
        let mut queue = EventQueue::new();
        queue.schedule(10, 1, impact(2));
        queue.cancel_owned(1, EventFilter::Any);
        queue.schedule(10, 1, impact(2));
        let evt = queue.pop_due(10).unwrap();
        assert_eq!(evt.seq, 1);
    }
}
