//! Per-board lock table
//!
//! SQLite serializes writers through `BEGIN IMMEDIATE`, but structural
//! operations also hold in-process locks on the boards they touch. Locks are
//! always taken in ascending `BoardId` order, so two operations that need the
//! same pair of boards (for example two crossing moves) queue up instead of
//! deadlocking.

use crate::models::BoardId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guards for a set of boards, released together on drop
pub struct BoardLocks {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl BoardLocks {
    /// Number of distinct boards held
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Table of per-board async mutexes
#[derive(Default)]
pub struct BoardLockTable {
    entries: Mutex<HashMap<BoardId, Arc<AsyncMutex<()>>>>,
}

impl BoardLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every board in `ids`, in ascending ID order
    ///
    /// Duplicates are locked once. The returned guards must be held for the
    /// whole write transaction.
    pub async fn lock_all(&self, ids: &[BoardId]) -> BoardLocks {
        let mut ordered = ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let mutexes = self.mutexes_for(&ordered);

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        BoardLocks { guards }
    }

    /// Fetch (or insert) the mutex of each board, pruning entries nobody holds
    fn mutexes_for(&self, ordered: &[BoardId]) -> Vec<Arc<AsyncMutex<()>>> {
        // The std mutex is never held across an await
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries.retain(|id, mutex| Arc::strong_count(mutex) > 1 || ordered.contains(id));

        ordered
            .iter()
            .map(|id| entries.entry(*id).or_default().clone())
            .collect()
    }

    /// Number of boards currently tracked by the table
    pub fn tracked(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
