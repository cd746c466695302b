#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub filtered: u64,
    pub malformed: u64,
    pub deltas_merged: u64,
    pub snapshots_applied: u64,
    pub stale_entries: u64,
    pub sends_skipped: u64,
}
