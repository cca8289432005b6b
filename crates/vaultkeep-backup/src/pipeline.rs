//! The backup pipeline: archive → upload → retention → notify, as one run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::task;
use tokio::time::timeout;
use tracing::{info, warn};
use vaultkeep_archive::{archive_file_name, create_archive, ArchiveError};
use vaultkeep_core::NotificationEvent;
use vaultkeep_notify::FanoutNotifier;
use vaultkeep_storage::{ObjectStorage, StorageError};

use crate::retention::RetentionManager;

/// Time budget for the upload phase.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Time budget for the retention phase.
pub const RETENTION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Errors fatal to a backup run.
///
/// Retention and notification failures are absorbed inside the run and never
/// surface here.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("failed to create archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("archive task failed: {0}")]
    Join(#[from] task::JoinError),

    #[error("failed to stage archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to upload archive: {0}")]
    Upload(#[source] StorageError),

    #[error("upload timed out after {0:?}")]
    UploadTimeout(Duration),
}

/// Executes the four-phase backup sequence for one cycle.
///
/// A pipeline is shared between the scheduler and manual invocation; the
/// caller guarantees at most one run is active at a time.
pub struct BackupPipeline {
    storage: Arc<dyn ObjectStorage>,
    notifier: Arc<FanoutNotifier>,
    retention: RetentionManager,
    folders: Vec<PathBuf>,
    name_prefix: String,
    keep_count: i64,
}

impl BackupPipeline {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<FanoutNotifier>,
        folders: Vec<PathBuf>,
        name_prefix: String,
        keep_count: i64,
    ) -> Self {
        let retention = RetentionManager::new(Arc::clone(&storage));
        Self {
            storage,
            notifier,
            retention,
            folders,
            name_prefix,
            keep_count,
        }
    }

    /// Execute one backup run.
    ///
    /// Exactly one Success or Failure notification is broadcast per run, here
    /// and nowhere else; callers observing the returned error must not send
    /// another.
    pub async fn run(&self) -> Result<(), BackupError> {
        match self.execute().await {
            Ok(()) => Ok(()),
            Err(error) => {
                let event = NotificationEvent::Failure {
                    cause: error.to_string(),
                };
                if self.notifier.broadcast(&event).await.is_err() {
                    warn!("failed to send failure notification");
                }
                Err(error)
            }
        }
    }

    async fn execute(&self) -> Result<(), BackupError> {
        info!("starting backup run");

        // Owns the archive for the whole run; dropped on every exit path,
        // including panics, removing the staged file.
        let staging = tempfile::tempdir()?;
        let file_name = archive_file_name(&self.name_prefix, Local::now());
        let archive_path = staging.path().join(&file_name);

        info!(folders = self.folders.len(), "creating archive");
        let folders = self.folders.clone();
        let dest = archive_path.clone();
        task::spawn_blocking(move || create_archive(&folders, &dest)).await??;

        let size = tokio::fs::metadata(&archive_path).await?.len();
        info!(name = %file_name, size_bytes = size, "archive created");

        let url = match timeout(UPLOAD_TIMEOUT, self.storage.upload(&archive_path)).await {
            Ok(Ok(url)) => url,
            Ok(Err(source)) => return Err(BackupError::Upload(source)),
            Err(_) => return Err(BackupError::UploadTimeout(UPLOAD_TIMEOUT)),
        };
        info!(url = %url, "upload successful");

        let deleted = self.enforce_retention().await;

        let event = NotificationEvent::Success {
            name: file_name,
            url,
            size,
        };
        if self.notifier.broadcast(&event).await.is_err() {
            warn!("failed to send success notification");
        }

        for name in deleted {
            let url = self.storage.public_url(&name);
            let event = NotificationEvent::Deletion { name, url };
            if self.notifier.broadcast(&event).await.is_err() {
                warn!("failed to send deletion notification");
            }
        }

        info!("backup run complete");
        Ok(())
    }

    /// Run the retention phase. Failures and timeouts are logged, never
    /// escalated: they must not void a successful upload. Returns the names
    /// that were actually deleted, for deletion notifications.
    async fn enforce_retention(&self) -> Vec<String> {
        if self.keep_count <= 0 {
            return Vec::new();
        }

        info!(keep_count = self.keep_count, "checking for old backups to delete");
        match timeout(
            RETENTION_TIMEOUT,
            self.retention.enforce(&self.name_prefix, self.keep_count),
        )
        .await
        {
            Ok(Ok(deleted)) => {
                if deleted.is_empty() {
                    info!("no old backups to delete");
                } else {
                    info!(count = deleted.len(), "deleted old backups");
                }
                deleted
            }
            Ok(Err(error)) => {
                warn!(error = %error, "failed to cleanup old backups");
                error.deleted
            }
            Err(_) => {
                warn!(timeout = ?RETENTION_TIMEOUT, "retention cleanup timed out");
                Vec::new()
            }
        }
    }
}
