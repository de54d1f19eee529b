//! Runtime configuration for the ride store.
//!
//! Resolution order: built-in defaults, then `ridelog.toml` (from an
//! explicit path or the store root), then `RIDELOG_*` environment
//! overrides. A missing file is not an error; an unreadable or invalid one
//! is.

use crate::core::error::{Result, RideLogError};
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CAPACITY: usize = 5;
pub const DEFAULT_ROOT: &str = ".ridelog";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for BackendKind {
    type Err = RideLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(RideLogError::ConfigError(format!(
                "unknown backend '{}' (expected 'sqlite' or 'memory')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RideLogConfig {
    /// Rides retained per user.
    pub capacity: usize,
    pub backend: BackendKind,
    pub busy_timeout_secs: u64,
    /// Reject rides whose stop_time precedes start_time.
    pub enforce_time_order: bool,
    /// Append one audit event per storage operation.
    pub audit: bool,
}

impl Default for RideLogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backend: BackendKind::Sqlite,
            busy_timeout_secs: 5,
            enforce_time_order: false,
            audit: true,
        }
    }
}

impl RideLogConfig {
    /// Load from `explicit` if given, else from `<root>/ridelog.toml` if present.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => root.join(schemas::CONFIG_FILE_NAME),
        };

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(RideLogError::IoError)?;
            let config: RideLogConfig = toml::from_str(&content).map_err(|e| {
                RideLogError::ConfigError(format!("{}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), "loaded configuration");
            config
        } else if explicit.is_some() {
            return Err(RideLogError::ConfigError(format!(
                "config file {} not found",
                path.display()
            )));
        } else {
            RideLogConfig::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RIDELOG_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(capacity) = try_override(&lookup, "RIDELOG_CAPACITY")? {
            self.capacity = capacity;
        }
        if let Some(backend) = try_override(&lookup, "RIDELOG_BACKEND")? {
            self.backend = backend;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RideLogError::ConfigError(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.backend == BackendKind::Memory {
            warn!("memory backend selected; rides will not outlive this process");
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

fn try_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| RideLogError::ConfigError(format!("invalid {} value '{}': {}", key, raw, e)))
}

/// Store root from the CLI flag, then `RIDELOG_ROOT`, then `./.ridelog`.
pub fn resolve_root(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("RIDELOG_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
}
