//! Contest, gate and winner entity <-> model mappers

use contest_core::entities::{Contest, Gate, Winner};
use contest_core::value_objects::{ChatId, ContestFlags, ContestId, EntryId, MessageId, UserId};

use crate::models::{ContestModel, GateModel, WinnerModel};

/// Convert ContestModel to Contest entity
impl From<ContestModel> for Contest {
    fn from(model: ContestModel) -> Self {
        Contest {
            id: ContestId::new(model.id),
            owner_id: UserId::new(model.owner_id),
            channel_id: ChatId::new(model.channel_id),
            group_id: model.group_id.map(ChatId::new),
            message_id: model.message_id.map(MessageId::new),
            code: model.code,
            kind: model.settings.0,
            text: model.text,
            winner_count: model.winner_count.max(0) as u32,
            flags: ContestFlags::from_i64(model.flags),
            is_open: model.is_open,
            created_at: model.created_at,
            closed_at: model.closed_at,
        }
    }
}

impl From<GateModel> for Gate {
    fn from(model: GateModel) -> Self {
        Gate {
            id: model.id,
            contest_id: ContestId::new(model.contest_id),
            kind: model.kind.0,
            title: model.title,
            invite_link: model.invite_link,
        }
    }
}

impl From<WinnerModel> for Winner {
    fn from(model: WinnerModel) -> Self {
        Winner {
            contest_id: ContestId::new(model.contest_id),
            position: model.position.max(0) as u32,
            entry_id: EntryId::new(model.entry_id),
            user_id: UserId::new(model.user_id),
            display_name: model.display_name,
        }
    }
}
