use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Scoped access to the ride database.
///
/// Every logical operation opens its own connection through [`DbBroker::with_conn`]
/// and drops it when the closure returns. When auditing is on, one event per
/// operation is appended to `ride.events.jsonl` in the store root. The audit
/// trail is best effort: a failed append is logged and the operation's own
/// result is returned unchanged.
pub struct DbBroker {
    root: PathBuf,
    audit_log_path: Option<PathBuf>,
    audit_lock: Mutex<()>,
    busy_timeout: Duration,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(root: &Path, busy_timeout: Duration, audit: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            audit_log_path: audit.then(|| root.join(schemas::AUDIT_LOG_NAME)),
            audit_lock: Mutex::new(()),
            busy_timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_log_path.as_deref()
    }

    /// Execute a closure with a fresh connection to the specified DB.
    pub fn with_conn<F, R>(&self, db_path: &Path, op_name: &str, f: F) -> Result<R, error::RideLogError>
    where
        F: FnOnce(&mut Connection) -> Result<R, error::RideLogError>,
    {
        let db_id = db_path.file_name().unwrap_or_default().to_string_lossy().to_string();
        debug!(op = op_name, db = %db_id, "acquiring connection");
        let mut conn = db::db_connect(&db_path.to_string_lossy(), self.busy_timeout)?;

        let result = f(&mut conn);
        drop(conn);

        let status = if result.is_ok() { "success" } else { "error" };
        // The operation has already committed; an audit failure must not turn it into an error.
        if let Err(e) = self.log_event(op_name, &db_id, status) {
            warn!(op = op_name, db = %db_id, error = %e, "audit append failed");
        }

        result
    }

    fn log_event(&self, op: &str, db_id: &str, status: &str) -> Result<(), error::RideLogError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let Some(path) = &self.audit_log_path else {
            return Ok(());
        };

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };
        let line = serde_json::to_string(&ev)?;

        let _guard = self
            .audit_lock
            .lock()
            .map_err(|_| error::RideLogError::LockPoisoned("audit log".to_string()))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(error::RideLogError::IoError)?;

        writeln!(f, "{}", line).map_err(error::RideLogError::IoError)?;
        Ok(())
    }
}

/// Read back the audit trail, oldest first.
pub fn read_audit_log(path: &Path) -> Result<Vec<BrokerEvent>, error::RideLogError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(error::RideLogError::from))
        .collect()
}
