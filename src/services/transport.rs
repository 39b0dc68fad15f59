use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{MessageId, Recipient};

use crate::error::AppError;

/// Handle of a message the transport has published, enough to pin or
/// reference it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub message_id: i64,
}

/// The chat platform seam. Both operations are fallible and callers
/// treat their failures independently.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn publish_poll(
        &self,
        chat_id: &str,
        question: &str,
        options: &[String],
        topic_id: Option<i64>,
    ) -> Result<MessageRef, AppError>;

    async fn pin(&self, chat_id: &str, message: &MessageRef) -> Result<(), AppError>;
}

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Chat ids are stored as strings: numeric ids or `@channelname`.
    fn recipient(chat_id: &str) -> Result<Recipient, AppError> {
        if chat_id.starts_with('@') {
            return Ok(Recipient::ChannelUsername(chat_id.to_string()));
        }

        chat_id
            .parse::<i64>()
            .map(|id| Recipient::Id(ChatId(id)))
            .map_err(|_| AppError::Transport(format!("invalid chat id '{chat_id}'")))
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn publish_poll(
        &self,
        chat_id: &str,
        question: &str,
        options: &[String],
        topic_id: Option<i64>,
    ) -> Result<MessageRef, AppError> {
        let recipient = Self::recipient(chat_id)?;

        let mut request = self
            .bot
            .send_poll(recipient, question.to_string(), options.to_vec())
            .is_anonymous(false)
            .allows_multiple_answers(false);

        if let Some(topic_id) = topic_id {
            request = request.message_thread_id(topic_id as i32);
        }

        let message = request
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(MessageRef {
            message_id: i64::from(message.id.0),
        })
    }

    async fn pin(&self, chat_id: &str, message: &MessageRef) -> Result<(), AppError> {
        let recipient = Self::recipient(chat_id)?;

        self.bot
            .pin_chat_message(recipient, MessageId(message.message_id as i32))
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(())
    }
}
