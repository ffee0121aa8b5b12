//! User and channel link entity <-> model mappers

use contest_core::entities::{ChannelLink, User};
use contest_core::value_objects::{ChatId, UserId};

use crate::models::{ChannelLinkModel, UserModel};

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: UserId::new(model.id),
            display_name: model.display_name,
            points: model.points,
            referrer_id: model.referrer_id.map(UserId::new),
            created_at: model.created_at,
        }
    }
}

impl From<ChannelLinkModel> for ChannelLink {
    fn from(model: ChannelLinkModel) -> Self {
        ChannelLink {
            owner_id: UserId::new(model.owner_id),
            chat_id: ChatId::new(model.chat_id),
            title: model.title,
            created_at: model.created_at,
        }
    }
}
