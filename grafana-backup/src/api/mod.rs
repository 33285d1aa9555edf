//! Grafana HTTP API access.

pub mod client;
pub mod models;

pub use client::GrafanaClient;
pub use models::{DashboardSummary, Folder};
