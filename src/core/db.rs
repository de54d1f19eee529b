use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub fn db_connect(db_path: &str, busy_timeout: Duration) -> Result<Connection, error::RideLogError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(busy_timeout)
        .map_err(error::RideLogError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::RideLogError::RusqliteError)?;
    Ok(conn)
}

pub fn rides_db_path(root: &Path) -> PathBuf {
    root.join(schemas::RIDES_DB_NAME)
}

/// Create the store root and the `rides` table if they are missing.
pub fn initialize_rides_db(broker: &DbBroker) -> Result<(), error::RideLogError> {
    let db_path = rides_db_path(broker.root());
    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).map_err(error::RideLogError::IoError)?;
    }

    broker.with_conn(&db_path, "rides.init", |conn| {
        conn.execute(schemas::RIDES_DB_SCHEMA, [])?;
        conn.execute(schemas::RIDES_DB_SCHEMA_INDEX, [])?;
        Ok(())
    })?;

    info!(path = %db_path.display(), "ride database ready");
    Ok(())
}
