use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RideLogError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl RideLogError {
    /// Process exit status for the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            RideLogError::ValidationError(_) | RideLogError::ConfigError(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RideLogError>;
