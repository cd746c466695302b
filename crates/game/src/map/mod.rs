mod layout;

pub use layout::{ArenaLayout, Platform, SpawnArea};
