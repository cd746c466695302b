mod id;
mod player;
mod store;

pub use id::{ChannelId, IdSource, PlayerId, SequentialIds, UuidIds};
pub use player::{PlayerState, Transform};
pub use store::{GameState, StateMap};
