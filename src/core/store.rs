//! Bounded-retention ride store.
//!
//! The store keeps at most `capacity` rides per user. Inserting into a full
//! history evicts that user's oldest rides first (by `start_time`, ties by
//! insertion order). The count/evict/append sequence runs under a per-user
//! lock and, inside the storage handle, as one atomic unit.

use crate::core::broker::DbBroker;
use crate::core::config::{BackendKind, RideLogConfig};
use crate::core::error::{Result, RideLogError};
use crate::core::locks::KeyedLocks;
use crate::core::ride::{Ride, ValidationPolicy};
use crate::core::storage::{MemoryStorage, RideStorage, SqliteStorage};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RideStore {
    storage: Arc<dyn RideStorage>,
    capacity: usize,
    policy: ValidationPolicy,
    locks: KeyedLocks,
}

impl RideStore {
    pub fn new(storage: Arc<dyn RideStorage>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RideLogError::ConfigError(
                "capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            storage,
            capacity,
            policy: ValidationPolicy::default(),
            locks: KeyedLocks::new(),
        })
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the storage handle `config` asks for under `root`.
    pub fn open(root: &Path, config: &RideLogConfig) -> Result<Self> {
        let storage: Arc<dyn RideStorage> = match config.backend {
            BackendKind::Sqlite => {
                fs::create_dir_all(root).map_err(RideLogError::IoError)?;
                let broker = DbBroker::new(root, config.busy_timeout(), config.audit);
                Arc::new(SqliteStorage::open(broker)?)
            }
            BackendKind::Memory => Arc::new(MemoryStorage::new()),
        };
        debug!(backend = storage.name(), root = %root.display(), "opened ride store");

        Ok(Self::new(storage, config.capacity)?.with_policy(ValidationPolicy {
            enforce_time_order: config.enforce_time_order,
        }))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Remove every ride for every user. Idempotent.
    pub fn reset(&self) -> Result<()> {
        self.storage.reset()?;
        info!(backend = self.storage.name(), "ride store reset");
        Ok(())
    }

    /// Validate and store `ride`, returning how many older rides were evicted.
    pub fn insert(&self, ride: &Ride) -> Result<usize> {
        ride.check(&self.policy)?;

        let evicted = self.locks.with_key(&ride.user_id, || {
            self.storage.insert_bounded(ride, self.capacity)
        })?;

        if evicted > 0 {
            info!(
                user_id = %ride.user_id,
                evicted,
                capacity = self.capacity,
                "dropped oldest rides"
            );
        }
        Ok(evicted)
    }

    /// Snapshot of every stored ride.
    pub fn all_rides(&self) -> Result<Vec<Ride>> {
        let rides = self.storage.all_rides()?;
        debug!(count = rides.len(), "read all rides");
        Ok(rides)
    }

    /// `user_id`'s rides, oldest insertion first. Empty for unknown users.
    pub fn rides_for(&self, user_id: &str) -> Result<Vec<Ride>> {
        let rides = self.storage.rides_for(user_id)?;
        debug!(user_id, count = rides.len(), "read user rides");
        Ok(rides)
    }
}
