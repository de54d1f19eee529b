//! Core modules for ridelog's bounded ride store and its analytics.
//!
//! Geometry and ride records are leaves; the store builds on the storage
//! handles and the broker; analytics only ever reads store snapshots.

pub mod analytics;
pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod locks;
pub mod output;
pub mod ride;
pub mod schemas;
pub mod storage;
pub mod store;
pub mod time;
