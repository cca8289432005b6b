//! Shared domain types.

/// One lifecycle outcome to report through the notification channels.
///
/// Events are immutable once constructed; every registered channel receives the
/// same event independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A backup archive was created and uploaded.
    Success {
        /// Archive file name, e.g. `nightly-20240104-030509.tar.gz`.
        name: String,
        /// Public download URL for the uploaded archive.
        url: String,
        /// Archive size in bytes.
        size: u64,
    },
    /// The backup run failed before the upload completed.
    Failure {
        /// Rendered cause of the failure.
        cause: String,
    },
    /// An old archive was deleted by retention enforcement.
    Deletion {
        /// Name of the deleted archive.
        name: String,
        /// The URL the archive used to be available at.
        url: String,
    },
}
