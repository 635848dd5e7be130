//! Per-thread request serialization

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async lock per thread id
///
/// Each entry counts the requests holding or waiting on it. The count is
/// dropped when a request finishes or is cancelled while waiting, and the
/// entry goes with the last one.
#[derive(Default)]
pub struct ThreadLocks {
    inner: Mutex<HashMap<String, Slot>>,
}

#[derive(Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `thread_id`
    pub async fn acquire(&self, thread_id: &str) -> ThreadGuard<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let slot = map.entry(thread_id.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        let registration = Registration {
            locks: self,
            thread_id: thread_id.to_string(),
        };

        let guard = lock.lock_owned().await;
        ThreadGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of threads currently locked or waited on
    pub fn active(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, thread_id: &str) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = map.get_mut(thread_id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                map.remove(thread_id);
            }
        }
    }
}

/// One request's claim on a slot, held from the first wait until release
struct Registration<'a> {
    locks: &'a ThreadLocks,
    thread_id: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.thread_id);
    }
}

/// Held for the duration of one request against a thread
pub struct ThreadGuard<'a> {
    // Field order matters: the mutex is unlocked before the slot is released.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a>,
}
