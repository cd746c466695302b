use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

pub type Line = Arc<str>;

/// Named broadcast channels, created on first use and dropped once nobody listens.
pub struct ChannelHub {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<Line>>>,
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, channel: &str) -> (broadcast::Sender<Line>, broadcast::Receiver<Line>) {
        let mut channels = self.lock();
        let sender = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone();
        let receiver = sender.subscribe();
        (sender, receiver)
    }

    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    pub fn member_count(&self, channel: &str) -> usize {
        self.lock()
            .get(channel)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Forgets channels without members; returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|name, sender| {
            let keep = sender.receiver_count() > 0;
            if !keep {
                log::debug!("Channel {} is empty, closing", name);
            }
            keep
        });
        before - channels.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Line>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
