//! Retention enforcement: keep at most N most-recent archives per series.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use vaultkeep_storage::{ObjectStorage, StorageError};

/// Retention failure, carrying the names deleted before the operation stopped.
///
/// Deletions are not transactional: completed ones are not rolled back, and
/// the caller still owes a deletion notification for each name in `deleted`.
#[derive(Debug, Error)]
#[error("retention cleanup failed after deleting {} object(s): {source}", deleted.len())]
pub struct RetentionError {
    pub deleted: Vec<String>,
    #[source]
    pub source: StorageError,
}

/// Enforces "keep at most N most-recent objects matching a prefix".
pub struct RetentionManager {
    storage: Arc<dyn ObjectStorage>,
}

impl RetentionManager {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Delete the oldest surplus objects in the series named by `prefix`,
    /// keeping the `keep_count` most recent.
    ///
    /// A `keep_count` of zero or less disables enforcement entirely: no
    /// listing is performed and the result is empty. Deletion proceeds
    /// sequentially, oldest first; the first failure stops the operation and
    /// the error reports the names removed up to that point.
    pub async fn enforce(
        &self,
        prefix: &str,
        keep_count: i64,
    ) -> Result<Vec<String>, RetentionError> {
        if keep_count <= 0 {
            return Ok(Vec::new());
        }
        let keep = usize::try_from(keep_count).unwrap_or(usize::MAX);

        let mut objects = self
            .storage
            .list_with_metadata(prefix)
            .await
            .map_err(|source| RetentionError {
                deleted: Vec::new(),
                source,
            })?;

        // Oldest first; stable, so listing order breaks ties.
        objects.sort_by_key(|object| object.last_modified);

        if objects.len() <= keep {
            return Ok(Vec::new());
        }
        let surplus = objects.len() - keep;

        let mut deleted = Vec::with_capacity(surplus);
        for object in objects.into_iter().take(surplus) {
            match self.storage.delete(&object.name).await {
                Ok(()) => {
                    info!(name = %object.name, "deleted expired backup");
                    deleted.push(object.name);
                }
                Err(source) => return Err(RetentionError { deleted, source }),
            }
        }

        Ok(deleted)
    }
}
