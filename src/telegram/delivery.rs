use async_trait::async_trait;
use teloxide::prelude::*;

use crate::reminder::UserId;
use crate::scheduling::{DeliveryError, ReminderDeliveryChannel};

pub struct TelegramDeliveryChannel {
    bot: Bot,
}

impl TelegramDeliveryChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReminderDeliveryChannel for TelegramDeliveryChannel {
    async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(user_id), text)
            .await
            .map_err(|error| DeliveryError::Transport(error.into()))?;

        Ok(())
    }
}
