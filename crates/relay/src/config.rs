#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    /// Lines buffered per channel before slow members start skipping.
    pub channel_capacity: usize,
    pub outbound_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: arena::DEFAULT_RELAY_PORT,
            channel_capacity: 256,
            outbound_queue: 256,
        }
    }
}
