use std::time::Instant;

use crate::state::{ChannelId, IdSource, PlayerId};

/// Identity of one client connection: which channel it plays on and as whom.
#[derive(Debug, Clone)]
pub struct Session {
    channel: ChannelId,
    player_id: PlayerId,
    started_at: Instant,
    tick: u64,
}

impl Session {
    pub fn new(channel: ChannelId, player_id: PlayerId) -> Self {
        Self {
            channel,
            player_id,
            started_at: Instant::now(),
            tick: 0,
        }
    }

    pub fn generate(channel: ChannelId, ids: &mut impl IdSource) -> Self {
        Self::new(channel, ids.next_id())
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}
