//! Notification channels and fan-out delivery.
//!
//! A channel formats and transports one [`NotificationEvent`] independently of
//! the others; the fan-out delivers each event to every configured channel
//! without letting one channel's failure suppress the rest.

pub mod channel;
pub mod discord;
pub mod fanout;
pub mod telegram;

pub use channel::{format_size, Channel, NotifyError};
pub use discord::DiscordChannel;
pub use fanout::FanoutNotifier;
pub use telegram::TelegramChannel;
