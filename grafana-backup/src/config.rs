//! Configuration management for the backup utility.
//!
//! Loads configuration from a JSON file: a `grafana_urls` host list for
//! multi-host runs, or top-level `user`/`pw` credentials combined with the
//! `--name`/`--url` CLI flags for a single host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::errors::{BackupError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosts to back up (multi-host mode)
    #[serde(default)]
    pub grafana_urls: Vec<HostConfig>,

    /// Username for single-host mode
    #[serde(default)]
    pub user: Option<String>,

    /// Password for single-host mode
    #[serde(default)]
    pub pw: Option<String>,

    /// Folder selector applied to hosts that do not set their own
    #[serde(default)]
    pub folder: Option<FolderSelector>,

    /// Abort the whole run on the first transport failure
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,

    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host name, used for the per-host backup directory
    pub name: String,

    /// Grafana base URL
    pub url: String,

    pub username: String,
    pub password: String,

    /// Verify the server TLS certificate
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Folder holding the dashboards to back up, by id or exact title
    #[serde(default)]
    pub folder: Option<FolderSelector>,
}

/// Identifies a Grafana folder explicitly, either by numeric id or by exact
/// title. Zero or multiple matches at resolution time are hard errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderSelector {
    Id(i64),
    Title(String),
}

impl fmt::Display for FolderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderSelector::Id(id) => write!(f, "id {}", id),
            FolderSelector::Title(title) => write!(f, "title '{}'", title),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub local: LocalStorageConfig,

    /// Compress the day's backup directory into a tarball after the run
    #[serde(default = "default_archive")]
    pub archive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Write backup files to local disk. Remote storage is not implemented;
    /// turning this off makes every store a no-op.
    #[serde(default = "default_local_enabled")]
    pub enabled: bool,

    /// Root directory for backup output
    #[serde(default = "default_backup_folder")]
    pub backup_folder: PathBuf,
}

// Default values
fn default_fail_fast() -> bool {
    true
}

fn default_verify_ssl() -> bool {
    true
}

fn default_archive() -> bool {
    true
}

fn default_local_enabled() -> bool {
    true
}

fn default_backup_folder() -> PathBuf {
    PathBuf::from("backup")
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            local: LocalStorageConfig::default(),
            archive: default_archive(),
        }
    }
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        LocalStorageConfig {
            enabled: default_local_enabled(),
            backup_folder: default_backup_folder(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the set of hosts for this run.
    ///
    /// A non-empty `grafana_urls` list wins; otherwise the CLI `--url` is
    /// combined with the top-level `user`/`pw` credentials, with the local
    /// hostname standing in when `--name` is not given. Every resolved host
    /// must end up with a folder selector.
    pub fn hosts(&self, cli_name: Option<&str>, cli_url: Option<&str>) -> Result<Vec<HostConfig>> {
        let mut hosts = if !self.grafana_urls.is_empty() {
            self.grafana_urls.clone()
        } else {
            let url = cli_url.ok_or_else(|| {
                BackupError::Config(
                    "no grafana_urls in the configuration and no --url given".to_string(),
                )
            })?;
            let name = cli_name
                .map(str::to_string)
                .or_else(|| hostname::get().ok().and_then(|h| h.into_string().ok()))
                .ok_or_else(|| {
                    BackupError::Config("no --name given and no local hostname".to_string())
                })?;
            let (username, password) = match (&self.user, &self.pw) {
                (Some(user), Some(pw)) => (user.clone(), pw.clone()),
                _ => {
                    return Err(BackupError::Config(
                        "single-host mode needs `user` and `pw` in the configuration".to_string(),
                    ))
                }
            };
            vec![HostConfig {
                name,
                url: url.to_string(),
                username,
                password,
                verify_ssl: default_verify_ssl(),
                folder: None,
            }]
        };

        for host in &mut hosts {
            if host.folder.is_none() {
                host.folder = self.folder.clone();
            }
            if host.folder.is_none() {
                return Err(BackupError::Config(format!(
                    "host {} has no folder selector (set `folder` on the host or at the top level)",
                    host.name
                )));
            }
        }

        Ok(hosts)
    }
}
