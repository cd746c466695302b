use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::relay::{RelayChannel, RelayError};

#[derive(Debug, Default)]
struct HubInner {
    members: HashMap<u32, VecDeque<String>>,
    next_member: u32,
}

/// In-process relay: every line reaches every member, the sender included.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self) -> MemoryRelay {
        let mut inner = lock(&self.inner);
        let member = inner.next_member;
        inner.next_member += 1;
        inner.members.insert(member, VecDeque::new());

        MemoryRelay {
            hub: Arc::clone(&self.inner),
            member,
            open: true,
        }
    }

    pub fn member_count(&self) -> usize {
        lock(&self.inner).members.len()
    }
}

#[derive(Debug)]
pub struct MemoryRelay {
    hub: Arc<Mutex<HubInner>>,
    member: u32,
    open: bool,
}

impl RelayChannel for MemoryRelay {
    fn send(&mut self, line: &str) -> Result<(), RelayError> {
        if !self.open {
            return Err(RelayError::Closed);
        }

        let mut inner = lock(&self.hub);
        for queue in inner.members.values_mut() {
            queue.push_back(line.to_owned());
        }
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<String>, RelayError> {
        if !self.open {
            return Ok(Vec::new());
        }

        let mut inner = lock(&self.hub);
        Ok(inner
            .members
            .get_mut(&self.member)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if self.open {
            lock(&self.hub).members.remove(&self.member);
            self.open = false;
        }
    }
}

impl Drop for MemoryRelay {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
