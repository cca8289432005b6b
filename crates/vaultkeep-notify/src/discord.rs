//! Discord webhook channel.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use vaultkeep_core::NotificationEvent;

use crate::channel::{format_size, Channel, NotifyError, REQUEST_TIMEOUT};

const CHANNEL: &str = "discord";

const SUCCESS_COLOR: u32 = 3_066_993;
const FAILURE_COLOR: u32 = 15_158_332;
const DELETION_COLOR: u32 = 16_776_960;

#[derive(Debug, Serialize)]
struct WebhookMessage {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<EmbedField>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    inline: bool,
}

/// Delivers events to a Discord webhook as rich embeds.
pub struct DiscordChannel {
    client: Client,
    webhook_url: String,
}

impl DiscordChannel {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| NotifyError::Transport {
                channel: CHANNEL,
                source,
            })?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    fn embed(event: &NotificationEvent) -> Embed {
        let timestamp = Utc::now().to_rfc3339();
        match event {
            NotificationEvent::Success { name, url, size } => Embed {
                title: "✅ Backup Successful".to_string(),
                description: "A new backup has been created and uploaded successfully!"
                    .to_string(),
                color: SUCCESS_COLOR,
                fields: vec![
                    EmbedField {
                        name: "File Name".to_string(),
                        value: name.clone(),
                        inline: false,
                    },
                    EmbedField {
                        name: "File Size".to_string(),
                        value: format_size(*size),
                        inline: true,
                    },
                    EmbedField {
                        name: "Download Link".to_string(),
                        value: format!("[Click here to download]({url})"),
                        inline: false,
                    },
                ],
                timestamp,
            },
            NotificationEvent::Failure { cause } => Embed {
                title: "❌ Backup Failed".to_string(),
                description: "The backup process encountered an error.".to_string(),
                color: FAILURE_COLOR,
                fields: vec![EmbedField {
                    name: "Error".to_string(),
                    value: cause.clone(),
                    inline: false,
                }],
                timestamp,
            },
            NotificationEvent::Deletion { name, url } => Embed {
                title: "🗑️ Old Backup Deleted".to_string(),
                description: "An old backup has been automatically deleted due to retention limit."
                    .to_string(),
                color: DELETION_COLOR,
                fields: vec![
                    EmbedField {
                        name: "Deleted File".to_string(),
                        value: name.clone(),
                        inline: false,
                    },
                    EmbedField {
                        name: "Previous Download Link".to_string(),
                        value: format!("`{url}`"),
                        inline: false,
                    },
                ],
                timestamp,
            },
        }
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let message = WebhookMessage {
            embeds: vec![Self::embed(event)],
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|source| NotifyError::Transport {
                channel: CHANNEL,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                channel: CHANNEL,
                status,
            });
        }

        Ok(())
    }
}
