mod config;
mod engine;
mod roster;

pub use config::{MergePolicy, SyncConfig};
pub use engine::{MessageOutcome, SyncEngine};
pub use roster::{Roster, RosterEvent, RosterSink, diff_states};
