//! ChannelLink entity - ownership binding between a user and a chat

use chrono::{DateTime, Utc};

use crate::value_objects::{ChatId, UserId};

/// A chat (channel or group) an owner has linked as a contest destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLink {
    pub owner_id: UserId,
    pub chat_id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ChannelLink {
    pub fn new(owner_id: UserId, chat_id: ChatId, title: String) -> Self {
        Self {
            owner_id,
            chat_id,
            title,
            created_at: Utc::now(),
        }
    }
}
