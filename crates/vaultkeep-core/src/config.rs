//! Configuration module
//!
//! Configuration is read from a TOML file and validated immediately after
//! parsing. Validation failures are fatal at startup: a process with an
//! unusable bucket, an empty folder list, or no notification channel must not
//! begin scheduling backups.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_NAME_PREFIX: &str = "backup";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Object-storage connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Cloudflare account id; the storage endpoint is derived from it.
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Base URL archives are publicly served from.
    pub public_base_url: String,
}

/// Discord webhook channel settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

/// Telegram bot channel settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

/// Backup series settings: what to archive, when, and how many to keep.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Cron expression (with seconds field) driving the schedule.
    pub schedule: String,
    /// Folders to include in each archive.
    pub folders: Vec<PathBuf>,
    /// Prefix for archive names; also scopes retention to this series.
    #[serde(default)]
    pub name_prefix: String,
    /// Number of archives to keep; zero or negative disables retention.
    #[serde(default)]
    pub retention_keep: i64,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub discord: Option<DiscordConfig>,
    pub telegram: Option<TelegramConfig>,
    pub backup: BackupConfig,
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Whether a Discord channel is configured.
    pub fn discord_enabled(&self) -> bool {
        self.discord
            .as_ref()
            .is_some_and(|discord| !discord.webhook_url.is_empty())
    }

    /// Whether a Telegram channel is configured.
    pub fn telegram_enabled(&self) -> bool {
        self.telegram
            .as_ref()
            .is_some_and(|telegram| !telegram.bot_token.is_empty())
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.storage.account_id.is_empty() {
            return Err(ConfigError::Invalid("storage.account_id is required".into()));
        }
        if self.storage.access_key_id.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.access_key_id is required".into(),
            ));
        }
        if self.storage.secret_access_key.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.secret_access_key is required".into(),
            ));
        }
        if self.storage.bucket.is_empty() {
            return Err(ConfigError::Invalid("storage.bucket is required".into()));
        }
        if self.storage.public_base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.public_base_url is required".into(),
            ));
        }

        if !self.discord_enabled() && !self.telegram_enabled() {
            return Err(ConfigError::Invalid(
                "at least one notification channel (discord or telegram) must be configured".into(),
            ));
        }
        if self.telegram_enabled()
            && self
                .telegram
                .as_ref()
                .is_some_and(|telegram| telegram.chat_id.is_empty())
        {
            return Err(ConfigError::Invalid(
                "telegram.chat_id is required when telegram.bot_token is provided".into(),
            ));
        }

        if self.backup.schedule.is_empty() {
            return Err(ConfigError::Invalid("backup.schedule is required".into()));
        }
        if self.backup.folders.is_empty() {
            return Err(ConfigError::Invalid(
                "backup.folders must contain at least one folder".into(),
            ));
        }
        if self.backup.name_prefix.is_empty() {
            self.backup.name_prefix = DEFAULT_NAME_PREFIX.to_string();
        }

        Ok(())
    }
}
