//! Chat platform capability
//!
//! Everything the core needs from the messaging platform. Implementations
//! live with the transport; the core only ever sees these calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::value_objects::{ChatId, MessageId, UserId};

/// Membership of a user in a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// Member, administrator or creator
    #[inline]
    pub fn is_member(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }

    #[inline]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "creator" => Some(Self::Creator),
            "administrator" => Some(Self::Administrator),
            "member" => Some(Self::Member),
            "restricted" => Some(Self::Restricted),
            "left" => Some(Self::Left),
            "kicked" => Some(Self::Kicked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// Flood control; retry after the given number of seconds
    #[error("rate limited, retry after {0}s")]
    RetryAfter(u64),

    /// The bot was blocked or lacks rights in the chat
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("network error: {0}")]
    Network(String),
}

impl PlatformError {
    /// Permanent failures are skipped, never retried
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Forbidden(_) | Self::BadRequest(_))
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn get_membership_status(&self, chat: ChatId, user: UserId)
        -> PlatformResult<MemberStatus>;

    async fn send_message(&self, chat: ChatId, text: &str) -> PlatformResult<MessageId>;

    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str)
        -> PlatformResult<()>;

    async fn create_invite_link(&self, chat: ChatId) -> PlatformResult<String>;

    async fn get_chat_title(&self, chat: ChatId) -> PlatformResult<String>;

    /// Send a stars invoice; `payload` comes back with the payment confirmation
    async fn send_invoice(
        &self,
        user: UserId,
        title: &str,
        payload: &str,
        amount: i64,
    ) -> PlatformResult<()>;
}

/// Source of per-group interaction points for the interaction gate
#[async_trait]
pub trait InteractionSignal: Send + Sync {
    /// Points `user` has accumulated in `group`, or `None` when unknown
    async fn points(&self, group: ChatId, user: UserId) -> Option<i64>;
}

/// Default signal: no data, so interaction gates never pass
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInteractionSignal;

#[async_trait]
impl InteractionSignal for NoInteractionSignal {
    async fn points(&self, _group: ChatId, _user: UserId) -> Option<i64> {
        None
    }
}
