//! vaultkeep: scheduled folder backups to S3-compatible object storage.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use vaultkeep_backup::{BackupPipeline, BackupScheduler};
use vaultkeep_core::Config;
use vaultkeep_notify::{Channel, DiscordChannel, FanoutNotifier, TelegramChannel};
use vaultkeep_storage::{ObjectStorage, R2Storage};

#[derive(Parser)]
#[command(
    name = "vaultkeep",
    version,
    about = "Archives folders on a schedule, uploads them to object storage, and prunes old backups"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Run a single backup and exit
    #[arg(long)]
    once: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn build_channels(config: &Config) -> Result<Vec<Box<dyn Channel>>, anyhow::Error> {
    let mut channels: Vec<Box<dyn Channel>> = Vec::new();

    if let Some(discord) = config.discord.as_ref().filter(|d| !d.webhook_url.is_empty()) {
        channels.push(Box::new(DiscordChannel::new(discord.webhook_url.clone())?));
        info!("discord channel initialized");
    }
    if let Some(telegram) = config.telegram.as_ref().filter(|t| !t.bot_token.is_empty()) {
        channels.push(Box::new(TelegramChannel::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
        )?));
        info!("telegram channel initialized");
    }

    anyhow::ensure!(!channels.is_empty(), "no notification channels configured");
    Ok(channels)
}

/// Wait for Ctrl+C (SIGINT) or SIGTERM.
///
/// # Panics
/// Panics if a signal handler cannot be installed (unrecoverable system error).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        _ = terminate => {
            info!("received terminate signal");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(&cli.config).context("failed to load configuration")?;
    info!(path = %cli.config.display(), "configuration loaded");

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        R2Storage::new(
            &config.storage.account_id,
            &config.storage.access_key_id,
            &config.storage.secret_access_key,
            &config.storage.bucket,
            &config.storage.public_base_url,
        )
        .context("failed to initialize storage client")?,
    );
    info!(bucket = %config.storage.bucket, "storage client initialized");

    let notifier = Arc::new(FanoutNotifier::new(build_channels(&config)?));

    let pipeline = Arc::new(BackupPipeline::new(
        storage,
        notifier,
        config.backup.folders.clone(),
        config.backup.name_prefix.clone(),
        config.backup.retention_keep,
    ));
    let mut scheduler = BackupScheduler::new(pipeline, &config.backup.schedule);

    if cli.once {
        info!("running backup once");
        scheduler.run_once().await.context("backup failed")?;
        info!("backup completed successfully");
        return Ok(());
    }

    scheduler.start().context("failed to start scheduler")?;
    info!("vaultkeep is running, press Ctrl+C to exit");

    shutdown_signal().await;

    info!("shutting down");
    scheduler.stop();
    Ok(())
}
