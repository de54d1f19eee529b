//! Per-key mutual exclusion for ride inserts.
//!
//! Each user id maps to its own mutex, created on first use. Holding a
//! user's guard serializes the count/evict/insert sequence for that user
//! while inserts for other users proceed in parallel. Entries are never
//! removed; the registry grows with the number of distinct users seen by
//! this process.

use crate::core::error::RideLogError;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct KeyedLocks {
    entries: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Result<Arc<Mutex<()>>, RideLogError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RideLogError::LockPoisoned("lock registry".to_string()))?;
        Ok(Arc::clone(
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_key<F, R>(&self, key: &str, f: F) -> Result<R, RideLogError>
    where
        F: FnOnce() -> Result<R, RideLogError>,
    {
        let entry = self.entry(key)?;
        let _guard = entry
            .lock()
            .map_err(|_| RideLogError::LockPoisoned(format!("user '{}'", key)))?;
        f()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
