use async_trait::async_trait;
use thiserror::Error;

use crate::reminder::UserId;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Outbound notification channel. Failures are transient from the caller's
/// point of view; retrying is the firing loop's job, not the channel's.
#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync {
    async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;
}
