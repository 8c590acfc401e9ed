//! Per-meal exclusive locks.
//!
//! Bookings for the same meal queue on one async mutex (FIFO, so the first
//! to acquire is the first to validate); bookings for different meals never
//! touch each other's mutex. Entries are dropped once nobody holds or waits
//! on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct MealLocks {
    slots: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl MealLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the caller is the only holder for `meal_id`.
    pub async fn acquire(self: &Arc<Self>, meal_id: i64) -> MealLockGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(meal_id).or_default())
        };

        let guard = slot.lock_owned().await;
        log::debug!("acquired booking lock for meal {meal_id}");

        MealLockGuard {
            meal_id,
            registry: Arc::clone(self),
            guard: Some(guard),
        }
    }

    /// Number of meals with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Releases the meal's lock on drop.
#[derive(Debug)]
pub struct MealLockGuard {
    meal_id: i64,
    registry: Arc<MealLocks>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl MealLockGuard {
    pub fn meal_id(&self) -> i64 {
        self.meal_id
    }
}

impl Drop for MealLockGuard {
    fn drop(&mut self) {
        // Release first so the strong count below no longer includes us.
        drop(self.guard.take());

        let mut slots = self
            .registry
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&self.meal_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.meal_id);
        }
    }
}
