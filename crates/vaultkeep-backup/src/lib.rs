//! Backup lifecycle orchestration.
//!
//! One [`pipeline::BackupPipeline`] run sequences archive creation, upload,
//! retention cleanup, and notification as a single fault-tolerant unit of
//! work; the [`scheduler::BackupScheduler`] repeats it on a cron schedule.

pub mod pipeline;
pub mod retention;
pub mod scheduler;

pub use pipeline::{BackupError, BackupPipeline};
pub use retention::{RetentionError, RetentionManager};
pub use scheduler::{BackupScheduler, ScheduleError};
