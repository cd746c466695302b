pub mod combat;
pub mod map;
pub mod net;
pub mod physics;
pub mod player;
pub mod session;
pub mod state;
pub mod sync;

pub use combat::{HitResolver, KNOCKOUT_HEIGHT, MAX_SHOT_RANGE};
pub use map::{ArenaLayout, Platform, SpawnArea};
pub use net::{
    ChannelEnvelope, ConnectionState, DEFAULT_RELAY_PORT, EnvelopeError, MAX_LINE_BYTES,
    MemoryHub, MemoryRelay, Payload, RelayChannel, RelayError, SyncStats, TcpRelay,
};
pub use physics::{
    ActorShape, ArenaWorld, GeometryQuery, ObjectTag, PhysicsConfig, PhysicsSimulator, RayHit,
    StepReport,
};
pub use player::{CameraRig, InputFlags, InputState, LocalPlayer, ViewRay};
pub use session::{
    ClientSettings, DEFAULT_TICK_RATE, FixedTimestep, GameClient, Session, TickReport,
};
pub use state::{
    ChannelId, GameState, IdSource, PlayerId, PlayerState, SequentialIds, StateMap, Transform,
    UuidIds,
};
pub use sync::{
    MergePolicy, MessageOutcome, Roster, RosterEvent, RosterSink, SyncConfig, SyncEngine,
    diff_states,
};
