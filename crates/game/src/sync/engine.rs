use std::collections::VecDeque;
use std::time::Instant;

use crate::net::{ChannelEnvelope, Payload, RelayChannel, SyncStats};
use crate::session::Session;
use crate::state::{GameState, PlayerId, PlayerState, StateMap};

use super::config::{MergePolicy, SyncConfig};
use super::roster::{Roster, RosterEvent, diff_states};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Malformed,
    /// Foreign channel or our own echo.
    Filtered,
    Merged,
    /// Versioned delta older than what we hold; still answered with a snapshot.
    Stale,
    Replaced,
}

pub struct SyncEngine<R> {
    relay: R,
    session: Session,
    state: GameState,
    last_broadcast: PlayerState,
    recent_broadcasts: VecDeque<PlayerState>,
    pending_override: Option<PlayerState>,
    config: SyncConfig,
    roster: Roster,
    events: VecDeque<RosterEvent>,
    stats: SyncStats,
    last_send: Option<Instant>,
    offline_logged: bool,
}

impl<R: RelayChannel> SyncEngine<R> {
    pub fn new(relay: R, session: Session, spawn: PlayerState, config: SyncConfig) -> Self {
        let state = GameState::with_local(session.player_id().clone(), spawn);
        let mut recent_broadcasts = VecDeque::with_capacity(config.echo_history + 1);
        recent_broadcasts.push_back(spawn);

        Self {
            relay,
            session,
            state,
            last_broadcast: spawn,
            recent_broadcasts,
            pending_override: None,
            config,
            roster: Roster::new(),
            events: VecDeque::new(),
            stats: SyncStats::default(),
            last_send: None,
            offline_logged: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn local_id(&self) -> &PlayerId {
        self.session.player_id()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn last_broadcast(&self) -> &PlayerState {
        &self.last_broadcast
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut R {
        &mut self.relay
    }

    pub fn remote_count(&self) -> usize {
        self.state.len().saturating_sub(1)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = RosterEvent> + '_ {
        self.events.drain(..)
    }

    /// Pose a peer forced onto the local player since the last call.
    pub fn take_override(&mut self) -> Option<PlayerState> {
        self.pending_override.take()
    }

    pub fn announce(&mut self, now: Instant) -> bool {
        match self.state.single(self.session.player_id()) {
            Some(delta) => self.send(&delta, now),
            None => false,
        }
    }

    pub fn send(&mut self, states: &StateMap, now: Instant) -> bool {
        if !self.relay.is_open() {
            self.note_offline();
            self.stats.sends_skipped += 1;
            return false;
        }

        let envelope =
            ChannelEnvelope::new(self.session.channel(), self.session.player_id(), states);
        let line = match envelope.and_then(|envelope| envelope.encode()) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to encode broadcast: {}", e);
                return false;
            }
        };

        match self.relay.send(&line) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += line.len() as u64;
                self.last_send = Some(now);
                true
            }
            Err(e) => {
                log::warn!("Relay send failed: {}", e);
                self.stats.sends_skipped += 1;
                if !self.relay.is_open() {
                    self.note_offline();
                }
                false
            }
        }
    }

    pub fn broadcast_full(&mut self, now: Instant) -> bool {
        let snapshot = self.state.entries().clone();
        self.send(&snapshot, now)
    }

    /// Handles every line the relay delivered since the previous tick.
    pub fn pump(&mut self, now: Instant) -> usize {
        let was_open = self.relay.is_open();
        let lines = match self.relay.poll() {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("Relay receive failed: {}", e);
                Vec::new()
            }
        };

        if was_open && !self.relay.is_open() {
            self.note_offline();
        }

        let count = lines.len();
        for line in lines {
            self.handle_message(&line, now);
        }
        count
    }

    pub fn handle_message(&mut self, line: &str, now: Instant) -> MessageOutcome {
        self.stats.messages_received += 1;
        self.stats.bytes_received += line.len() as u64;

        let envelope = match ChannelEnvelope::decode(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::debug!("Discarding relay message: {}", e);
                self.stats.malformed += 1;
                return MessageOutcome::Malformed;
            }
        };

        if !envelope.is_for(self.session.channel()) || &envelope.name == self.session.player_id() {
            self.stats.filtered += 1;
            return MessageOutcome::Filtered;
        }

        let payload = match envelope.payload() {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("Discarding message from {}: {}", envelope.name, e);
                self.stats.malformed += 1;
                return MessageOutcome::Malformed;
            }
        };

        if self.roster.revive(&envelope.name) {
            log::info!("Player {} is back", envelope.name);
        }

        let before = self.state.entries().clone();

        let outcome = match payload {
            Payload::Delta(id, state) => {
                let merged = !self.is_buried(&id, &state) && self.merge_entry(id, state);
                if merged {
                    self.stats.deltas_merged += 1;
                } else {
                    self.stats.stale_entries += 1;
                }
                if merged {
                    MessageOutcome::Merged
                } else {
                    MessageOutcome::Stale
                }
            }
            Payload::Snapshot(mut states) => {
                states.retain(|id, state| !self.is_buried(id, state));
                self.apply_snapshot(states);
                self.stats.snapshots_applied += 1;
                MessageOutcome::Replaced
            }
        };

        self.finish_mutation(&before, now);
        if self.state.contains(&envelope.name) {
            self.roster.touch(&envelope.name, now);
        }

        // Every delta is answered with our whole world so the sender learns who is here.
        if matches!(outcome, MessageOutcome::Merged | MessageOutcome::Stale) {
            self.broadcast_full(now);
        }

        outcome
    }

    /// Publishes the live local pose as a delta once it strays past the drift threshold.
    pub fn broadcast_if_drifted(&mut self, live: &PlayerState, now: Instant) -> bool {
        if live.position.distance(self.last_broadcast.position) <= self.config.drift_threshold {
            return false;
        }

        self.publish_local(live, now);
        true
    }

    pub fn housekeeping(&mut self, live: &PlayerState, now: Instant) {
        if let Some(interval) = self.config.heartbeat {
            let due = self
                .last_send
                .is_none_or(|sent| now.saturating_duration_since(sent) >= interval);
            if due {
                self.publish_local(live, now);
            }
        }

        self.reap(now);
    }

    pub fn reap(&mut self, now: Instant) -> Vec<PlayerId> {
        let Some(timeout) = self.config.reap_after else {
            return Vec::new();
        };

        self.roster.expire_tombstones(now, timeout);

        let expired = self.roster.expired(now, timeout);
        for id in &expired {
            match self.state.remove(id) {
                Some(state) => {
                    log::info!("Player {} timed out", id);
                    self.roster.bury(id, state.seq, now);
                    self.events.push_back(RosterEvent::Left { id: id.clone() });
                }
                None => self.roster.forget(id),
            }
        }
        expired
    }

    /// Applies a local edit to one entry, as the hit resolver does to its target.
    pub fn edit_entry(&mut self, id: &PlayerId, edit: impl FnOnce(&mut PlayerState)) -> bool {
        let is_local = id == self.session.player_id();
        let policy = self.config.policy;

        let Some(entry) = self.state.get_mut(id) else {
            return false;
        };

        let before = *entry;
        edit(entry);
        if policy == MergePolicy::Versioned {
            entry.seq = before.seq + 1;
        }
        let after = *entry;

        if is_local {
            self.adopt_override(after);
        } else if !before.same_pose(&after) {
            self.events.push_back(RosterEvent::Moved {
                id: id.clone(),
                state: after,
            });
        }
        true
    }

    pub fn close(&mut self) {
        self.relay.close();
    }

    fn publish_local(&mut self, live: &PlayerState, now: Instant) {
        let mut next = PlayerState::new(live.position, live.yaw());
        if self.config.policy == MergePolicy::Versioned {
            let held = self
                .state
                .get(self.session.player_id())
                .map_or(0, |state| state.seq);
            next.seq = held.max(self.last_broadcast.seq) + 1;
        }

        let local = self.session.player_id().clone();
        self.state.insert(local.clone(), next);
        self.last_broadcast = next;
        self.remember(next);

        if let Some(delta) = self.state.single(&local) {
            self.send(&delta, now);
        }
    }

    /// Reaped players stay out until they send again, or carry a newer seq when versioned.
    fn is_buried(&self, id: &PlayerId, state: &PlayerState) -> bool {
        let seq = match self.config.policy {
            MergePolicy::Wholesale => None,
            MergePolicy::Versioned => Some(state.seq),
        };
        self.roster.is_buried(id, seq)
    }

    fn merge_entry(&mut self, id: PlayerId, incoming: PlayerState) -> bool {
        if !self.state.contains(&id) && self.remote_count() >= self.config.max_players {
            log::warn!(
                "Roster full ({} players), ignoring {}",
                self.config.max_players,
                id
            );
            return false;
        }

        match self.config.policy {
            MergePolicy::Wholesale => {
                self.state.insert(id, incoming);
                true
            }
            MergePolicy::Versioned => match self.state.get(&id) {
                Some(current) if incoming.seq <= current.seq => false,
                _ => {
                    self.state.insert(id, incoming);
                    true
                }
            },
        }
    }

    fn apply_snapshot(&mut self, states: StateMap) {
        match self.config.policy {
            MergePolicy::Wholesale => {
                let mut next = self.cap_roster(states);
                next.entry(self.session.player_id().clone())
                    .or_insert(self.last_broadcast);
                self.state.replace(next);
            }
            MergePolicy::Versioned => {
                for (id, state) in states {
                    if !self.merge_entry(id, state) {
                        self.stats.stale_entries += 1;
                    }
                }
            }
        }
    }

    fn cap_roster(&self, states: StateMap) -> StateMap {
        let local = self.session.player_id();
        let mut kept = StateMap::new();
        let mut remotes = 0;

        for (id, state) in states {
            if &id != local {
                if remotes >= self.config.max_players {
                    log::warn!("Roster full, dropping {} from snapshot", id);
                    continue;
                }
                remotes += 1;
            }
            kept.insert(id, state);
        }
        kept
    }

    fn finish_mutation(&mut self, before: &StateMap, now: Instant) {
        let local = self.session.player_id().clone();

        if let Some(current) = self.state.get(&local).copied() {
            if self.is_remote_override(&current) {
                self.adopt_override(current);
            }
        }

        diff_states(&local, before, self.state.entries(), &mut self.events);

        for id in self.state.ids() {
            if id != &local {
                self.roster.touch_if_new(id, now);
            }
        }
        for id in before.keys() {
            if !self.state.contains(id) {
                self.roster.forget(id);
            }
        }
    }

    fn is_remote_override(&self, current: &PlayerState) -> bool {
        match self.config.policy {
            MergePolicy::Wholesale => {
                // Echoes of our own earlier broadcasts are stale, not commands.
                !current.same_pose(&self.last_broadcast)
                    && !self.recent_broadcasts.iter().any(|sent| sent.same_pose(current))
            }
            MergePolicy::Versioned => current.seq > self.last_broadcast.seq,
        }
    }

    fn adopt_override(&mut self, state: PlayerState) {
        log::info!(
            "Local player moved by a peer to ({:.2}, {:.2}, {:.2})",
            state.position.x,
            state.position.y,
            state.position.z
        );
        self.last_broadcast = state;
        self.remember(state);
        self.pending_override = Some(state);
    }

    fn remember(&mut self, state: PlayerState) {
        self.recent_broadcasts.push_back(state);
        while self.recent_broadcasts.len() > self.config.echo_history {
            self.recent_broadcasts.pop_front();
        }
    }

    fn note_offline(&mut self) {
        if !self.offline_logged {
            log::warn!("Relay channel closed; local simulation continues offline");
            self.offline_logged = true;
        }
    }
}
