//! Cloudflare R2 backend built on the `object_store` S3 client.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};

use crate::traits::{ObjectStorage, RemoteObject, StorageError, StorageResult};

/// R2 storage client
///
/// R2 speaks the S3 protocol on an account-scoped endpoint; the region is
/// always `auto`.
#[derive(Debug, Clone)]
pub struct R2Storage {
    store: AmazonS3,
    bucket: String,
    public_base_url: String,
}

impl R2Storage {
    /// Create a new R2Storage instance.
    ///
    /// # Arguments
    /// * `account_id` - Cloudflare account id, used to derive the endpoint
    /// * `access_key_id` / `secret_access_key` - R2 API token credentials
    /// * `bucket` - bucket name
    /// * `public_base_url` - base URL the bucket is publicly served from
    pub fn new(
        account_id: &str,
        access_key_id: &str,
        secret_access_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> StorageResult<Self> {
        let endpoint = format!("https://{account_id}.r2.cloudflarestorage.com");

        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region("auto")
            .with_endpoint(endpoint)
            .with_access_key_id(access_key_id)
            .with_secret_access_key(secret_access_key)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store,
            bucket: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStorage for R2Storage {
    async fn upload(&self, path: &Path) -> StorageResult<String> {
        let name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?
            .to_string();

        let data = tokio::fs::read(path).await?;
        let size_bytes = data.len() as u64;
        let location = StorePath::from(name.as_str());

        let start = Instant::now();
        self.store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %name,
                    size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "R2 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %name,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "R2 upload successful"
        );

        Ok(self.public_url(&name))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let location = StorePath::from(name);

        self.store
            .delete(&location)
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("{name}: {e}")))?;

        tracing::info!(bucket = %self.bucket, key = %name, "R2 object deleted");
        Ok(())
    }

    async fn list_with_metadata(&self, prefix: &str) -> StorageResult<Vec<RemoteObject>> {
        // object_store prefixes are path-segment based; archive names share a
        // partial file-name prefix, so filter the full listing client-side.
        let mut stream = self.store.list(None);
        let mut objects = Vec::new();

        while let Some(entry) = stream.next().await {
            let meta = entry.map_err(|e| StorageError::ListFailed(e.to_string()))?;
            let name = meta.location.to_string();
            if !name.starts_with(prefix) {
                continue;
            }
            objects.push(RemoteObject {
                name,
                last_modified: meta.last_modified,
                size: meta.size,
            });
        }

        Ok(objects)
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_trims_trailing_slash() {
        let storage = R2Storage::new(
            "acct",
            "key",
            "secret",
            "backups",
            "https://backups.example.com/",
        )
        .unwrap();
        assert_eq!(
            storage.public_url("nightly-20240104-030509.tar.gz"),
            "https://backups.example.com/nightly-20240104-030509.tar.gz"
        );
    }
}
