use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::state::{PlayerId, PlayerState, StateMap};

#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    Joined { id: PlayerId, state: PlayerState },
    Moved { id: PlayerId, state: PlayerState },
    Left { id: PlayerId },
}

/// Consumer of remote-player lifecycle events, typically whatever draws the actors.
pub trait RosterSink {
    fn on_roster_event(&mut self, event: &RosterEvent);
}

/// A reaped player, kept out of relayed snapshots until it speaks for itself again.
#[derive(Debug, Clone, Copy)]
struct Tombstone {
    evicted_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Roster {
    last_seen: HashMap<PlayerId, Instant>,
    tombstones: HashMap<PlayerId, Tombstone>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, id: &PlayerId, now: Instant) {
        self.last_seen.insert(id.clone(), now);
    }

    pub fn touch_if_new(&mut self, id: &PlayerId, now: Instant) {
        self.last_seen.entry(id.clone()).or_insert(now);
    }

    pub fn forget(&mut self, id: &PlayerId) {
        self.last_seen.remove(id);
    }

    pub fn last_seen(&self, id: &PlayerId) -> Option<Instant> {
        self.last_seen.get(id).copied()
    }

    pub fn expired(&self, now: Instant, timeout: Duration) -> Vec<PlayerId> {
        let mut expired: Vec<PlayerId> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(**seen) > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();
        expired
    }

    pub fn bury(&mut self, id: &PlayerId, seq: u64, now: Instant) {
        self.last_seen.remove(id);
        self.tombstones.insert(
            id.clone(),
            Tombstone {
                evicted_at: now,
                seq,
            },
        );
    }

    /// Lifts the tombstone, returning whether there was one.
    pub fn revive(&mut self, id: &PlayerId) -> bool {
        self.tombstones.remove(id).is_some()
    }

    /// Whether `id` was reaped. A versioned entry newer than the one evicted is not buried.
    pub fn is_buried(&self, id: &PlayerId, seq: Option<u64>) -> bool {
        match (self.tombstones.get(id), seq) {
            (None, _) => false,
            (Some(stone), Some(seq)) => seq <= stone.seq,
            (Some(_), None) => true,
        }
    }

    pub fn expire_tombstones(&mut self, now: Instant, ttl: Duration) {
        self.tombstones
            .retain(|_, stone| now.saturating_duration_since(stone.evicted_at) <= ttl);
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

/// Appends the remote-player events that turn `before` into `after`.
pub fn diff_states(
    local: &PlayerId,
    before: &StateMap,
    after: &StateMap,
    events: &mut VecDeque<RosterEvent>,
) {
    for (id, state) in after {
        if id == local {
            continue;
        }
        match before.get(id) {
            None => events.push_back(RosterEvent::Joined {
                id: id.clone(),
                state: *state,
            }),
            Some(previous) if !previous.same_pose(state) => events.push_back(RosterEvent::Moved {
                id: id.clone(),
                state: *state,
            }),
            Some(_) => {}
        }
    }

    for id in before.keys() {
        if id != local && !after.contains_key(id) {
            events.push_back(RosterEvent::Left { id: id.clone() });
        }
    }
}
