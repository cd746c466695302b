use std::collections::BTreeMap;

use super::{PlayerId, PlayerState};

pub type StateMap = BTreeMap<PlayerId, PlayerState>;

/// Player id to last-known pose. Holds the local entry from construction on.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    entries: StateMap,
}

impl GameState {
    pub fn with_local(id: PlayerId, state: PlayerState) -> Self {
        let mut entries = StateMap::new();
        entries.insert(id, state);
        Self { entries }
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: PlayerId, state: PlayerState) -> Option<PlayerState> {
        self.entries.insert(id, state)
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerState> {
        self.entries.remove(id)
    }

    pub fn replace(&mut self, entries: StateMap) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &StateMap {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PlayerState)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn single(&self, id: &PlayerId) -> Option<StateMap> {
        self.entries.get(id).map(|state| {
            let mut delta = StateMap::new();
            delta.insert(id.clone(), *state);
            delta
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn starts_with_local_entry() {
        let local = PlayerId::from("me");
        let state = GameState::with_local(local.clone(), PlayerState::new(Vec3::ONE, 0.0));

        assert_eq!(state.len(), 1);
        assert!(state.contains(&local));
    }

    #[test]
    fn single_extracts_one_entry() {
        let local = PlayerId::from("me");
        let mut state = GameState::with_local(local.clone(), PlayerState::new(Vec3::ONE, 0.0));
        state.insert(PlayerId::from("other"), PlayerState::new(Vec3::ZERO, 1.0));

        let delta = state.single(&local).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[&local].position, Vec3::ONE);
        assert!(state.single(&PlayerId::from("missing")).is_none());
    }
}
