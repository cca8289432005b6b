//! Fan-out delivery over the configured channel set.

use tracing::warn;
use vaultkeep_core::NotificationEvent;

use crate::channel::{Channel, NotifyError};

/// Multicasts one event to every registered channel.
///
/// The channel set is fixed at startup. Delivery is sequential in registration
/// order; channels are low-volume, fire-and-forget transports.
pub struct FanoutNotifier {
    channels: Vec<Box<dyn Channel>>,
}

impl FanoutNotifier {
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Self {
        Self { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `event` to every channel.
    ///
    /// Every channel is invoked even when an earlier one fails; each failure
    /// is logged individually. Returns the last error encountered, purely as a
    /// signal that something failed; callers cannot tell which channel failed
    /// from the return value alone.
    pub async fn broadcast(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let mut last_error = None;

        for channel in &self.channels {
            if let Err(error) = channel.send(event).await {
                warn!(channel = channel.name(), error = %error, "notification delivery failed");
                last_error = Some(error);
            }
        }

        match last_error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}
