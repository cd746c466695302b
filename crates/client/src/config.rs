use std::time::Duration;

use arena::{ChannelId, ClientSettings, DEFAULT_RELAY_PORT, DEFAULT_TICK_RATE};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_addr: String,
    pub channel: ChannelId,
    pub tick_rate: u32,
    pub connect_timeout: Duration,
    /// Stop after this many ticks; `None` runs until the process is killed.
    pub max_ticks: Option<u64>,
    pub settings: ClientSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_addr: format!("127.0.0.1:{}", DEFAULT_RELAY_PORT),
            channel: ChannelId::new("arena"),
            tick_rate: DEFAULT_TICK_RATE,
            connect_timeout: Duration::from_secs(5),
            max_ticks: None,
            settings: ClientSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn finished(&self, tick: u64) -> bool {
        self.max_ticks.is_some_and(|max| tick >= max)
    }
}
