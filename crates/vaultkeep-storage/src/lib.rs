//! Object-storage abstraction and the S3-compatible (Cloudflare R2) backend.

pub mod r2;
pub mod traits;

pub use r2::R2Storage;
pub use traits::{ObjectStorage, RemoteObject, StorageError, StorageResult};
