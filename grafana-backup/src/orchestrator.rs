//! Multi-host dispatch.
//!
//! Each configured host gets one independent backup job on a bounded worker
//! pool; jobs share no state, the pool only caps concurrent HTTP and disk
//! work. The run reports completion only after every dispatched job has
//! finished. The fail-fast policy is explicit: when enabled, the first
//! transport-tier failure stops not-yet-started jobs and fails the run.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, HostConfig};
use crate::executor::{archive, BackupExecutor, BackupType};
use crate::utils::errors::{BackupError, Result};

/// Worker pool size for one run: available parallelism minus one, floor 1.
/// Computed per run, never cached at startup.
pub fn worker_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Run one backup pass for every host, then archive the day's directory once
/// all jobs have drained. The caller resolves the host list first (the CLI
/// folds single-host flags into it).
pub async fn run(config: &Config, hosts: Vec<HostConfig>, backup_type: BackupType) -> Result<()> {
    let date = chrono::Local::now().format("%d-%m-%Y").to_string();
    let backup_root = config.backup.local.backup_folder.clone();
    let pool_size = worker_pool_size();
    let total = hosts.len();

    info!(
        "Dispatching {} backup job(s) on a worker pool of {}",
        total, pool_size
    );

    let semaphore = Arc::new(Semaphore::new(pool_size));
    let cancel = CancellationToken::new();
    let mut handles = Vec::with_capacity(total);

    for host in hosts {
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let local = config.backup.local.clone();
        let backup_root = backup_root.clone();
        let date = date.clone();
        let fail_fast = config.fail_fast;

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| BackupError::Unknown(format!("worker pool closed: {}", e)))?;

            if cancel.is_cancelled() {
                info!(
                    "Skipping backup for host {} after an earlier failure",
                    host.name
                );
                return Ok(());
            }

            info!("Starting backup job for host {}", host.name);
            let name = host.name.clone();
            let executor = BackupExecutor::new(host, local, backup_type)?;

            match executor.run_daily_backup(&backup_root, &date).await {
                Ok(()) => {
                    info!("Completed backup for host {}", name);
                    Ok(())
                }
                Err(e) => {
                    error!("Error taking backup for host {}: {}", name, e);
                    if fail_fast && e.is_transport() {
                        cancel.cancel();
                    }
                    Err(e)
                }
            }
        }));
    }

    let mut failed = 0usize;
    let mut first_error = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(e) => {
                failed += 1;
                error!("Backup job panicked: {}", e);
            }
        }
    }

    if failed > 0 {
        let err = first_error.unwrap_or_else(|| {
            BackupError::Unknown(format!("{} backup job(s) failed", failed))
        });
        if config.fail_fast || failed == total {
            return Err(err);
        }
        error!("{} of {} backup job(s) failed", failed, total);
    }

    if config.backup.local.enabled && config.backup.archive {
        // A failed archive is logged; the uncompressed directory stays on disk.
        match archive::make_archive(&backup_root, &date).await {
            Ok(path) => info!("Archived {} into {}", date, path.display()),
            Err(e) => error!("Error making tarfile: {}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_size_has_floor_of_one() {
        assert!(worker_pool_size() >= 1);
    }

    #[test]
    fn test_worker_pool_size_leaves_one_core_free() {
        let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        if available > 1 {
            assert_eq!(worker_pool_size(), available - 1);
        } else {
            assert_eq!(worker_pool_size(), 1);
        }
    }
}
