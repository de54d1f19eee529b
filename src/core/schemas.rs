//! Database schema definitions for the ride store.
//!
//! Coordinates are fixed point with three fractional digits, stored as
//! integer thousandths. Timestamps are integer epoch seconds.

pub const RIDES_DB_NAME: &str = "rides.db";

pub const RIDES_DB_SCHEMA_DROP: &str = "DROP TABLE IF EXISTS rides";

pub const RIDES_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS rides (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        start_x INTEGER NOT NULL,
        start_y INTEGER NOT NULL,
        stop_x INTEGER NOT NULL,
        stop_y INTEGER NOT NULL,
        start_time INTEGER NOT NULL,
        stop_time INTEGER NOT NULL
    )
";
pub const RIDES_DB_SCHEMA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_rides_user_start ON rides(user_id, start_time, id)";

pub const RIDE_COLUMNS: &str = "user_id, start_x, start_y, stop_x, stop_y, start_time, stop_time";

pub const AUDIT_LOG_NAME: &str = "ride.events.jsonl";
pub const CONFIG_FILE_NAME: &str = "ridelog.toml";
