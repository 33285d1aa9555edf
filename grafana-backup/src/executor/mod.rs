//! Per-host backup pass.
//!
//! One full pass for a single Grafana host: metadata record, folder
//! resolution, dashboard fetch, and JSON file writes. Transport failures
//! from the API client abort the pass; storage failures are logged and the
//! pass carries on with whatever it can still write.

pub mod archive;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::GrafanaClient;
use crate::config::{HostConfig, LocalStorageConfig};
use crate::utils::errors::{BackupError, Result};

/// Kind of backup pass being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackupType {
    Daily,
}

impl BackupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupType::Daily => "daily",
        }
    }
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes one backup pass for a single host.
pub struct BackupExecutor {
    host: HostConfig,
    client: GrafanaClient,
    local: LocalStorageConfig,
    backup_type: BackupType,
}

impl BackupExecutor {
    pub fn new(
        host: HostConfig,
        local: LocalStorageConfig,
        backup_type: BackupType,
    ) -> Result<Self> {
        let client = GrafanaClient::new(&host)?;
        Ok(Self {
            host,
            client,
            local,
            backup_type,
        })
    }

    /// Directory this host's files land in: `{backup_root}/{date}/{host}/`.
    pub fn target_dir(&self, backup_root: &Path, date: &str) -> PathBuf {
        backup_root.join(date).join(&self.host.name)
    }

    /// One full backup pass: metadata record first, then the dashboard files.
    pub async fn run_daily_backup(&self, backup_root: &Path, date: &str) -> Result<()> {
        let target_dir = self.target_dir(backup_root, date);

        info!(
            "Taking Grafana JSON backup for host {}",
            self.host.name
        );

        self.write_metadata(&target_dir, "Auto");
        self.backup_dashboards(&target_dir).await
    }

    /// Fetch every dashboard in the configured folder and store it under
    /// `target_dir`. An empty folder is only a warning; the pass completes
    /// with zero dashboard files.
    pub async fn backup_dashboards(&self, target_dir: &Path) -> Result<()> {
        let selector = self.host.folder.as_ref().ok_or_else(|| {
            BackupError::Config(format!("host {} has no folder selector", self.host.name))
        })?;

        let folder = self.client.resolve_folder(selector).await?;
        let dashboards = self.client.list_dashboards(folder.id).await?;

        if dashboards.is_empty() {
            warn!(
                "Could not find any dashboards to back up under {}",
                folder.title
            );
        } else {
            info!(
                "Scanned data for backup - found {} dashboards in {}",
                dashboards.len(),
                folder.title
            );
        }

        let mut used_names = HashSet::new();
        for dashboard in &dashboards {
            let detail = self.client.dashboard_detail(&dashboard.uid).await?;
            let Some(definition) = detail.get("dashboard") else {
                error!(
                    "Response for dashboard {} carries no definition, skipping",
                    dashboard.uid
                );
                continue;
            };

            let file_name = unique_file_name(&dashboard.title, &dashboard.uid, &mut used_names);
            if let Err(e) = self.store(target_dir, &file_name, definition) {
                error!("Error storing dashboard {}: {}", dashboard.title, e);
            }
        }

        Ok(())
    }

    /// Record run time, backup type and mode as `.meta_data` in the target
    /// directory. A failed write is logged and the pass continues.
    pub fn write_metadata(&self, target_dir: &Path, mode: &str) {
        let meta_data = serde_json::json!({
            "time": chrono::Local::now().format("%d-%m-%Y %H:%M:%S").to_string(),
            "type": self.backup_type.as_str(),
            "mode": mode,
        });

        if let Err(e) = self.store(target_dir, ".meta_data", &meta_data) {
            error!("Error creating metadata: {}", e);
        }
    }

    /// Write `payload` as indented, key-sorted JSON under `dir`, creating
    /// parent directories as needed. A no-op when local storage is disabled.
    pub fn store(&self, dir: &Path, file_name: &str, payload: &Value) -> Result<()> {
        if !self.local.enabled {
            debug!("Local storage disabled, skipping {}", file_name);
            return Ok(());
        }

        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, serde_json::to_vec_pretty(payload)?)?;
        debug!("Stored {}", path.display());

        Ok(())
    }
}

/// Derive a flat file name from a dashboard title: lower-cased, spaces and
/// path separators replaced with underscores.
fn sanitized_file_name(title: &str) -> String {
    let name: String = title
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{}.json", name)
}

/// Titles are not unique in Grafana; when two sanitize to the same file name
/// the dashboard uid keeps them apart.
fn unique_file_name(title: &str, uid: &str, used: &mut HashSet<String>) -> String {
    let name = sanitized_file_name(title);
    if used.insert(name.clone()) {
        return name;
    }

    let fallback = format!("{}_{}.json", name.trim_end_matches(".json"), uid.to_lowercase());
    warn!(
        "Dashboard file name {} already taken, storing as {}",
        name, fallback
    );
    used.insert(fallback.clone());
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn executor(local: LocalStorageConfig) -> BackupExecutor {
        let host = HostConfig {
            name: "prod".to_string(),
            url: "http://g".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            verify_ssl: true,
            folder: None,
        };
        BackupExecutor::new(host, local, BackupType::Daily).unwrap()
    }

    #[test]
    fn test_sanitized_file_name() {
        assert_eq!(sanitized_file_name("CPU Usage"), "cpu_usage.json");
        assert_eq!(sanitized_file_name("disk/io stats"), "disk_io_stats.json");
        assert_eq!(sanitized_file_name("plain"), "plain.json");
    }

    #[test]
    fn test_sanitized_file_name_never_nests() {
        let name = sanitized_file_name("a/b\\c d");
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert_eq!(name, "a_b_c_d.json");
    }

    #[test]
    fn test_unique_file_name_appends_uid_on_collision() {
        let mut used = HashSet::new();
        assert_eq!(unique_file_name("CPU Usage", "a1", &mut used), "cpu_usage.json");
        assert_eq!(
            unique_file_name("cpu usage", "B2", &mut used),
            "cpu_usage_b2.json"
        );
    }

    #[test]
    fn test_target_dir_layout() {
        let executor = executor(LocalStorageConfig::default());
        assert_eq!(
            executor.target_dir(Path::new("backup"), "06-08-2026"),
            PathBuf::from("backup/06-08-2026/prod")
        );
    }

    #[test]
    fn test_store_writes_sorted_pretty_json() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(LocalStorageConfig {
            enabled: true,
            backup_folder: temp_dir.path().to_path_buf(),
        });

        let payload = serde_json::json!({"zeta": 1, "alpha": {"b": 2, "a": 3}});
        let dir = temp_dir.path().join("06-08-2026").join("prod");
        executor.store(&dir, "cpu_usage.json", &payload).unwrap();

        let written = std::fs::read_to_string(dir.join("cpu_usage.json")).unwrap();
        let alpha = written.find("\"alpha\"").unwrap();
        let zeta = written.find("\"zeta\"").unwrap();
        assert!(alpha < zeta);
        assert!(written.contains('\n'));

        let round_trip: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(round_trip, payload);
    }

    #[test]
    fn test_store_is_gated_by_local_flag() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(LocalStorageConfig {
            enabled: false,
            backup_folder: temp_dir.path().to_path_buf(),
        });

        let dir = temp_dir.path().join("out");
        executor
            .store(&dir, "cpu_usage.json", &serde_json::json!({}))
            .unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_write_metadata_record() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(LocalStorageConfig {
            enabled: true,
            backup_folder: temp_dir.path().to_path_buf(),
        });

        let dir = temp_dir.path().join("06-08-2026").join("prod");
        executor.write_metadata(&dir, "Auto");

        let meta: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(".meta_data")).unwrap())
                .unwrap();
        assert_eq!(meta["type"], "daily");
        assert_eq!(meta["mode"], "Auto");
        assert!(meta["time"].as_str().unwrap().len() >= 19);
    }
}
