//! Telegram bot channel.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use vaultkeep_core::NotificationEvent;

use crate::channel::{format_size, Channel, NotifyError, REQUEST_TIMEOUT};

const CHANNEL: &str = "telegram";

#[derive(Debug, Serialize)]
struct SendMessage {
    chat_id: String,
    text: String,
    parse_mode: &'static str,
}

/// Delivers events as Markdown messages through the Telegram bot API.
pub struct TelegramChannel {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| NotifyError::Transport {
                channel: CHANNEL,
                source,
            })?;

        Ok(Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn message_text(event: &NotificationEvent) -> String {
        match event {
            NotificationEvent::Success { name, url, size } => format!(
                "✅ *Backup Successful*\n\n\
                 A new backup has been created and uploaded successfully!\n\n\
                 *File Name:* `{name}`\n\
                 *File Size:* {}\n\
                 *Download Link:* [Click here]({url})",
                format_size(*size),
            ),
            NotificationEvent::Failure { cause } => format!(
                "❌ *Backup Failed*\n\n\
                 The backup process encountered an error.\n\n\
                 *Error:* `{cause}`"
            ),
            NotificationEvent::Deletion { name, url } => format!(
                "🗑️ *Old Backup Deleted*\n\n\
                 An old backup has been automatically deleted due to retention limit.\n\n\
                 *Deleted File:* `{name}`\n\
                 *Previous Download Link:* `{url}`"
            ),
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let api_url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let message = SendMessage {
            chat_id: self.chat_id.clone(),
            text: Self::message_text(event),
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(&api_url)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_text_lists_name_size_and_link() {
        let text = TelegramChannel::message_text(&NotificationEvent::Success {
            name: "nightly-20240104-030509.tar.gz".to_string(),
            url: "https://backups.example.com/nightly-20240104-030509.tar.gz".to_string(),
            size: 1024,
        });

        assert!(text.starts_with("✅ *Backup Successful*"));
        assert!(text.contains("`nightly-20240104-030509.tar.gz`"));
        assert!(text.contains("1.0 KB"));
        assert!(text.contains("[Click here](https://backups.example.com/"));
    }

    #[test]
    fn failure_text_quotes_cause() {
        let text = TelegramChannel::message_text(&NotificationEvent::Failure {
            cause: "upload timed out".to_string(),
        });

        assert!(text.starts_with("❌ *Backup Failed*"));
        assert!(text.contains("`upload timed out`"));
    }

    #[test]
    fn deletion_text_quotes_old_link() {
        let text = TelegramChannel::message_text(&NotificationEvent::Deletion {
            name: "nightly-20240101-000000.tar.gz".to_string(),
            url: "https://backups.example.com/nightly-20240101-000000.tar.gz".to_string(),
        });

        assert!(text.starts_with("🗑️ *Old Backup Deleted*"));
        assert!(text.contains("`nightly-20240101-000000.tar.gz`"));
    }
}
