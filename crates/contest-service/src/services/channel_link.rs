//! Channel link service
//!
//! Owners link the channels and groups they administer before publishing
//! contests there.

use contest_core::entities::ChannelLink;
use contest_core::{ChatId, DomainError, UserId};
use tracing::{info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Channel link service
pub struct ChannelLinkService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChannelLinkService<'a> {
    /// Create a new ChannelLinkService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Link a chat to its owner
    ///
    /// The owner must administer the chat. Linking again refreshes the title.
    #[instrument(skip(self))]
    pub async fn link_channel(&self, owner: UserId, chat: ChatId) -> ServiceResult<ChannelLink> {
        let status = self.ctx.platform().get_membership_status(chat, owner).await?;
        if !status.is_admin() {
            return Err(DomainError::NotChatAdmin.into());
        }

        let title = self.ctx.platform().get_chat_title(chat).await?;
        let link = ChannelLink::new(owner, chat, title);
        self.ctx.channel_link_repo().upsert(&link).await?;

        info!(owner_id = %owner, chat_id = %chat, "Channel linked");
        Ok(link)
    }

    /// Remove a link; returns whether one existed
    #[instrument(skip(self))]
    pub async fn unlink_channel(&self, owner: UserId, chat: ChatId) -> ServiceResult<bool> {
        let removed = self.ctx.channel_link_repo().delete(owner, chat).await?;
        if removed {
            info!(owner_id = %owner, chat_id = %chat, "Channel unlinked");
        }
        Ok(removed)
    }

    /// List the chats an owner linked
    #[instrument(skip(self))]
    pub async fn list(&self, owner: UserId) -> ServiceResult<Vec<ChannelLink>> {
        Ok(self.ctx.channel_link_repo().list_by_owner(owner).await?)
    }

    /// Fail with `ChannelNotLinked` unless `owner` linked `chat`
    pub async fn require_link(&self, owner: UserId, chat: ChatId) -> ServiceResult<ChannelLink> {
        self.ctx
            .channel_link_repo()
            .find(owner, chat)
            .await?
            .ok_or_else(|| DomainError::ChannelNotLinked(chat).into())
    }
}
