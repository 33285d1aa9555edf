//! Grafana Dashboard Backup Library
//!
//! Fetches dashboards from one or more Grafana hosts over the HTTP API and
//! stores them as JSON files on disk, optionally archived into a dated
//! gzip tarball.

pub mod api;
pub mod config;
pub mod executor;
pub mod orchestrator;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
