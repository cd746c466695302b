mod envelope;
mod memory;
mod relay;
mod stats;

pub use envelope::{ChannelEnvelope, EnvelopeError, MAX_LINE_BYTES, Payload};
pub use memory::{MemoryHub, MemoryRelay};
pub use relay::{ConnectionState, DEFAULT_RELAY_PORT, RelayChannel, RelayError, TcpRelay};
pub use stats::SyncStats;
