//! Storage handles the ride store is built on.
//!
//! [`RideStorage`] is the seam between the bounded-retention policy and the
//! engine that keeps rows. Implementations must make
//! [`RideStorage::insert_bounded`] atomic with respect to every other
//! operation on the same user, and every read must observe a consistent
//! snapshot.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::{Result, RideLogError};
use crate::core::ride::{Fixed3, FixedPoint, Ride};
use crate::core::schemas;
use rusqlite::{params, Row, TransactionBehavior};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::RwLock;

pub trait RideStorage: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Remove every ride and restart surrogate ids.
    fn reset(&self) -> Result<()>;

    /// Evict the oldest rides of `ride.user_id` (by `start_time`, then
    /// insertion order) until fewer than `capacity` remain, then append
    /// `ride`. Returns the number of rides evicted.
    fn insert_bounded(&self, ride: &Ride, capacity: usize) -> Result<usize>;

    /// Every stored ride, in insertion order.
    fn all_rides(&self) -> Result<Vec<Ride>>;

    /// One user's rides, in insertion order.
    fn rides_for(&self, user_id: &str) -> Result<Vec<Ride>>;
}

fn excess_for(count: usize, capacity: usize) -> usize {
    (count + 1).saturating_sub(capacity)
}

// ============================================================================
// SQLite
// ============================================================================

pub struct SqliteStorage {
    broker: DbBroker,
    db_path: PathBuf,
}

/// Raw column values of one `rides` row.
struct RideRow {
    user_id: String,
    start_x: i64,
    start_y: i64,
    stop_x: i64,
    stop_y: i64,
    start_time: i64,
    stop_time: i64,
}

impl RideRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            start_x: row.get(1)?,
            start_y: row.get(2)?,
            stop_x: row.get(3)?,
            stop_y: row.get(4)?,
            start_time: row.get(5)?,
            stop_time: row.get(6)?,
        })
    }

    fn into_ride(self) -> Result<Ride> {
        Ok(Ride {
            user_id: self.user_id,
            start: FixedPoint::new(
                Fixed3::from_thousandths(self.start_x)?,
                Fixed3::from_thousandths(self.start_y)?,
            ),
            stop: FixedPoint::new(
                Fixed3::from_thousandths(self.stop_x)?,
                Fixed3::from_thousandths(self.stop_y)?,
            ),
            start_time: self.start_time,
            stop_time: self.stop_time,
        })
    }
}

impl SqliteStorage {
    /// Open (and create if needed) `rides.db` under the broker's root.
    pub fn open(broker: DbBroker) -> Result<Self> {
        db::initialize_rides_db(&broker)?;
        let db_path = db::rides_db_path(broker.root());
        Ok(Self { broker, db_path })
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    fn query_rides(&self, op: &str, sql: &str, user_id: Option<&str>) -> Result<Vec<Ride>> {
        let rows = self.broker.with_conn(&self.db_path, op, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = match user_id {
                Some(user_id) => stmt
                    .query_map(params![user_id], RideRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
                None => stmt
                    .query_map([], RideRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
            };
            Ok(rows)
        })?;
        rows.into_iter().map(RideRow::into_ride).collect()
    }
}

impl RideStorage for SqliteStorage {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn reset(&self) -> Result<()> {
        self.broker.with_conn(&self.db_path, "rides.reset", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(schemas::RIDES_DB_SCHEMA_DROP, [])?;
            tx.execute(schemas::RIDES_DB_SCHEMA, [])?;
            tx.execute(schemas::RIDES_DB_SCHEMA_INDEX, [])?;
            tx.commit()?;
            Ok(())
        })
    }

    fn insert_bounded(&self, ride: &Ride, capacity: usize) -> Result<usize> {
        self.broker.with_conn(&self.db_path, "rides.insert", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM rides WHERE user_id = ?1",
                params![ride.user_id],
                |row| row.get(0),
            )?;
            let excess = excess_for(count as usize, capacity);

            let evicted = if excess > 0 {
                tx.execute(
                    "DELETE FROM rides WHERE id IN (
                        SELECT id FROM rides WHERE user_id = ?1
                        ORDER BY start_time ASC, id ASC LIMIT ?2
                    )",
                    params![ride.user_id, excess as i64],
                )?
            } else {
                0
            };

            tx.execute(
                &format!(
                    "INSERT INTO rides({}) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    schemas::RIDE_COLUMNS
                ),
                params![
                    ride.user_id,
                    ride.start.x.thousandths(),
                    ride.start.y.thousandths(),
                    ride.stop.x.thousandths(),
                    ride.stop.y.thousandths(),
                    ride.start_time,
                    ride.stop_time
                ],
            )?;
            tx.commit()?;
            Ok(evicted)
        })
    }

    fn all_rides(&self) -> Result<Vec<Ride>> {
        self.query_rides(
            "rides.all",
            &format!("SELECT {} FROM rides ORDER BY id ASC", schemas::RIDE_COLUMNS),
            None,
        )
    }

    fn rides_for(&self, user_id: &str) -> Result<Vec<Ride>> {
        self.query_rides(
            "rides.for_user",
            &format!(
                "SELECT {} FROM rides WHERE user_id = ?1 ORDER BY id ASC",
                schemas::RIDE_COLUMNS
            ),
            Some(user_id),
        )
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local storage. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    users: FxHashMap<String, Vec<(u64, Ride)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RideLogError {
    RideLogError::LockPoisoned("memory storage".to_string())
}

impl RideStorage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        *state = MemoryState::default();
        Ok(())
    }

    fn insert_bounded(&self, ride: &Ride, capacity: usize) -> Result<usize> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let id = state.next_id;
        state.next_id += 1;

        let rides = state.users.entry(ride.user_id.clone()).or_default();
        let excess = excess_for(rides.len(), capacity);
        if excess > 0 {
            let mut by_age: Vec<(i64, u64)> =
                rides.iter().map(|(id, r)| (r.start_time, *id)).collect();
            by_age.sort_unstable();
            let doomed: Vec<u64> = by_age.iter().take(excess).map(|(_, id)| *id).collect();
            rides.retain(|(id, _)| !doomed.contains(id));
        }
        rides.push((id, ride.clone()));
        Ok(excess)
    }

    fn all_rides(&self) -> Result<Vec<Ride>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut all: Vec<&(u64, Ride)> = state.users.values().flatten().collect();
        all.sort_unstable_by_key(|(id, _)| *id);
        Ok(all.into_iter().map(|(_, ride)| ride.clone()).collect())
    }

    fn rides_for(&self, user_id: &str) -> Result<Vec<Ride>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .users
            .get(user_id)
            .map(|rides| rides.iter().map(|(_, ride)| ride.clone()).collect())
            .unwrap_or_default())
    }
}
