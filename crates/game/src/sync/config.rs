use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Deltas overwrite their key, snapshots replace the whole map. Last write wins.
    #[default]
    Wholesale,
    /// Per-key sequence numbers; every merge keeps the higher one and never drops keys.
    Versioned,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub drift_threshold: f32,
    pub policy: MergePolicy,
    pub reap_after: Option<Duration>,
    pub heartbeat: Option<Duration>,
    pub max_players: usize,
    pub echo_history: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_threshold: 0.5,
            policy: MergePolicy::Wholesale,
            reap_after: None,
            heartbeat: None,
            max_players: 64,
            echo_history: 32,
        }
    }
}
