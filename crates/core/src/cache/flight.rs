//! Per-fingerprint in-flight table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters; the slot is removed when this reaches zero.
    users: usize,
}

/// Serializes work on equal keys while letting distinct keys proceed.
#[derive(Debug, Default)]
pub struct InFlight {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Held while a key is being worked on; the key is released on drop.
///
/// Dropping a guard that is still waiting (a cancelled `acquire`) also
/// gives up its place in the table.
pub struct FlightGuard<'a> {
    flights: &'a InFlight,
    key: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until no other holder has `key`, then take it.
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let lock = {
            let mut slots = self.slots();
            let slot = slots
                .entry(key.to_string())
                .or_insert_with(|| Slot { lock: Arc::default(), users: 0 });
            slot.users += 1;
            slot.lock.clone()
        };

        let mut guard = FlightGuard { flights: self, key: key.to_string(), held: None };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());

        let mut slots = self.flights.slots();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
