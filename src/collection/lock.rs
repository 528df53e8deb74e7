//! Per-key lease locks.
//!
//! One table per partition. A record names its holder and, optionally, a lease
//! after which another owner may take the lock over. Waiters on the owning
//! member park on `released` instead of spinning.

use crate::cluster::MemberId;
use crate::error::{MultiMapError, Result};
use crate::serialization::Datum;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

/// Identifies who holds a lock: the member a caller runs on plus a per-handle caller id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockOwner {
    pub member: MemberId,
    pub caller: String,
}

impl LockOwner {
    pub fn new(member: MemberId) -> Self {
        Self {
            member,
            caller: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockOutcome {
    Acquired,
    HeldByCaller,
    HeldByOther,
}

#[derive(Debug, Clone)]
struct LockRecord {
    owner: LockOwner,
    acquired_at: Instant,
    lease: Option<Duration>,
}

impl LockRecord {
    fn is_expired(&self, now: Instant) -> bool {
        match self.lease {
            Some(lease) => now.duration_since(self.acquired_at) > lease,
            None => false,
        }
    }
}

#[derive(Default)]
pub struct LockTable {
    locks: DashMap<(String, Datum), LockRecord>,
    released: Notify,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(
        &self,
        map_name: &str,
        key: Datum,
        owner: &LockOwner,
        lease: Option<Duration>,
    ) -> LockOutcome {
        let now = Instant::now();
        let record = LockRecord {
            owner: owner.clone(),
            acquired_at: now,
            lease,
        };

        match self.locks.entry((map_name.to_string(), key)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                LockOutcome::Acquired
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.is_expired(now) {
                    if &current.owner != owner {
                        tracing::warn!(
                            "Lease of {:?} on '{}' expired, handing lock to {:?}",
                            current.owner,
                            map_name,
                            owner
                        );
                    }
                    slot.insert(record);
                    LockOutcome::Acquired
                } else if &current.owner == owner {
                    LockOutcome::HeldByCaller
                } else {
                    LockOutcome::HeldByOther
                }
            }
        }
    }

    pub fn release(&self, map_name: &str, key: &Datum, owner: &LockOwner) -> Result<()> {
        match self.locks.entry((map_name.to_string(), key.clone())) {
            Entry::Occupied(slot) if &slot.get().owner == owner => {
                slot.remove();
            }
            _ => return Err(MultiMapError::LockNotHeld(map_name.to_string())),
        }
        self.released.notify_waiters();
        Ok(())
    }

    pub fn is_locked(&self, map_name: &str, key: &Datum) -> bool {
        self.locks
            .get(&(map_name.to_string(), key.clone()))
            .map(|record| !record.is_expired(Instant::now()))
            .unwrap_or(false)
    }

    pub fn locked_keys(&self, map_name: &str) -> usize {
        let now = Instant::now();
        self.locks
            .iter()
            .filter(|entry| entry.key().0 == map_name && !entry.value().is_expired(now))
            .count()
    }

    /// Drops every lock of one map and wakes waiters so they observe the change.
    pub fn clear_map(&self, map_name: &str) {
        self.locks.retain(|(name, _), _| name != map_name);
        self.released.notify_waiters();
    }

    pub fn clear(&self) {
        self.locks.clear();
        self.released.notify_waiters();
    }

    /// Future that completes on the next release. Create it before checking the
    /// lock so a release in between is not missed.
    pub fn notified(&self) -> Notified<'_> {
        self.released.notified()
    }
}
