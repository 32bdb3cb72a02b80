//! Per-experiment mutual exclusion
//!
//! Resolutions of the same experiment name run one at a time so a single draw is
//! committed; different names never contend. Registry entries are dropped once
//! nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::experiment::ExperimentName;
use crate::domain::DomainError;

type Registry = Arc<Mutex<HashMap<ExperimentName, Entry>>>;

#[derive(Debug)]
struct Entry {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

/// Registry of async locks keyed by experiment name
#[derive(Debug, Default, Clone)]
pub struct NameLocks {
    registry: Registry,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `name`
    pub async fn acquire(&self, name: &ExperimentName) -> Result<NameGuard, DomainError> {
        let (lock, ticket) = {
            let mut registry = self
                .registry
                .lock()
                .map_err(|e| DomainError::internal(format!("Lock registry poisoned: {}", e)))?;
            let entry = registry.entry(name.clone()).or_insert_with(|| Entry {
                lock: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            entry.users += 1;

            let ticket = Ticket {
                name: name.clone(),
                registry: Arc::clone(&self.registry),
            };
            (Arc::clone(&entry.lock), ticket)
        };

        // A waiter dropped here still releases its ticket
        let guard = lock.lock_owned().await;

        Ok(NameGuard {
            _guard: guard,
            ticket,
        })
    }

    /// Number of names currently held or awaited
    pub fn active(&self) -> usize {
        self.registry.lock().map(|r| r.len()).unwrap_or(0)
    }
}

/// One registered user of a name; the entry goes away with the last ticket
struct Ticket {
    name: ExperimentName,
    registry: Registry,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let Ok(mut registry) = self.registry.lock() else {
            return;
        };

        let idle = match registry.get_mut(&self.name) {
            Some(entry) => {
                entry.users = entry.users.saturating_sub(1);
                entry.users == 0
            }
            None => false,
        };

        if idle {
            registry.remove(&self.name);
        }
    }
}

/// Exclusive access to one experiment name, released on drop
pub struct NameGuard {
    // Fields drop in order: the mutex is released before the entry can be removed
    _guard: OwnedMutexGuard<()>,
    ticket: Ticket,
}

impl std::fmt::Debug for NameGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGuard")
            .field("name", &self.ticket.name)
            .finish()
    }
}
