mod client;
mod context;
mod tick;

pub use client::{ClientSettings, GameClient, TickReport};
pub use context::Session;
pub use tick::{DEFAULT_TICK_RATE, FixedTimestep};
