//! Shared test doubles for the orchestration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use vaultkeep_core::NotificationEvent;
use vaultkeep_notify::{Channel, NotifyError};
use vaultkeep_storage::{ObjectStorage, RemoteObject, StorageError, StorageResult};

/// In-memory bucket. Listings return the seeded snapshot only; uploads are
/// recorded but deliberately not folded back into the listing, so tests can
/// control exactly what the retention phase sees.
pub struct MockStorage {
    objects: Mutex<Vec<RemoteObject>>,
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    fail_delete_at: Option<usize>,
    fail_upload: bool,
    fail_list: bool,
}

impl MockStorage {
    pub fn new(objects: Vec<RemoteObject>) -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(objects),
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            fail_delete_at: None,
            fail_upload: false,
            fail_list: false,
        })
    }

    /// The delete call at `index` (0-based) fails; earlier ones succeed.
    pub fn with_failing_delete(objects: Vec<RemoteObject>, index: usize) -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(objects),
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            fail_delete_at: Some(index),
            fail_upload: false,
            fail_list: false,
        })
    }

    pub fn with_failing_upload() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            fail_delete_at: None,
            fail_upload: true,
            fail_list: false,
        })
    }

    pub fn with_failing_list() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            fail_delete_at: None,
            fail_upload: false,
            fail_list: true,
        })
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(&self, path: &Path) -> StorageResult<String> {
        if self.fail_upload {
            return Err(StorageError::UploadFailed("injected upload failure".into()));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("upload path should have a UTF-8 file name")
            .to_string();
        self.uploads.lock().unwrap().push(name.clone());
        Ok(self.public_url(&name))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let attempted = self.deletes.lock().unwrap().len();
        if self.fail_delete_at == Some(attempted) {
            return Err(StorageError::DeleteFailed("injected delete failure".into()));
        }
        self.deletes.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn list_with_metadata(&self, prefix: &str) -> StorageResult<Vec<RemoteObject>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(StorageError::ListFailed("injected list failure".into()));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|object| object.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn public_url(&self, name: &str) -> String {
        format!("https://backups.test/{name}")
    }
}

/// A remote archive last modified at midnight on the given day of 2024-01.
pub fn object(name: &str, day: u32) -> RemoteObject {
    RemoteObject {
        name: name.to_string(),
        last_modified: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        size: 1024,
    }
}

/// Shared, inspectable record of every event a [`RecordingChannel`] receives.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<NotificationEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn success_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, NotificationEvent::Success { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, NotificationEvent::Failure { .. }))
            .count()
    }

    pub fn deletion_names(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                NotificationEvent::Deletion { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingChannel {
    log: EventLog,
    fail: bool,
}

impl RecordingChannel {
    pub fn boxed(log: &EventLog) -> Box<dyn Channel> {
        Box::new(Self {
            log: log.clone(),
            fail: false,
        })
    }

    pub fn failing(log: &EventLog) -> Box<dyn Channel> {
        Box::new(Self {
            log: log.clone(),
            fail: true,
        })
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.log.0.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::Status {
                channel: "recording",
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(())
    }
}
