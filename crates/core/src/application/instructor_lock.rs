// Per-instructor serialization (optional hardening)
//
// When enabled, every lifecycle write holds the instructor's lock from the
// first read to the final persist, so two bookings for the same instructor
// cannot both pass the conflict scan.

use crate::domain::InstructorId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Held for the duration of one lifecycle write; empty when serialization is off
pub struct InstructorGuard<'a> {
    held: Option<(&'a InstructorLocks, InstructorId, OwnedMutexGuard<()>)>,
}

impl InstructorGuard<'_> {
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl Drop for InstructorGuard<'_> {
    fn drop(&mut self) {
        if let Some((locks, instructor_id, guard)) = self.held.take() {
            drop(guard);
            locks.release(instructor_id);
        }
    }
}

pub struct InstructorLocks {
    enabled: bool,
    locks: Mutex<HashMap<InstructorId, Arc<AsyncMutex<()>>>>,
}

impl InstructorLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn acquire(&self, instructor_id: InstructorId) -> InstructorGuard<'_> {
        if !self.enabled {
            return InstructorGuard { held: None };
        }

        // cloned under the map lock so `release` sees every waiter in the count
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(instructor_id).or_default())
        };

        debug!(instructor_id = instructor_id, "Waiting for instructor lock");
        let guard = lock.lock_owned().await;
        InstructorGuard {
            held: Some((self, instructor_id, guard)),
        }
    }

    /// Number of instructors with a lock entry (holders or waiters)
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, instructor_id: InstructorId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let idle = locks
            .get(&instructor_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&instructor_id);
        }
    }
}
