//! Entry entity <-> model mapper

use contest_core::entities::Entry;
use contest_core::value_objects::{ContestId, EntryId, UserId};

use crate::models::EntryModel;

impl From<EntryModel> for Entry {
    fn from(model: EntryModel) -> Self {
        Entry {
            id: EntryId::new(model.id),
            contest_id: ContestId::new(model.contest_id),
            user_id: UserId::new(model.user_id),
            // CHAR(8) pads; codes are always full length but trim anyway
            code: model.code.trim_end().to_string(),
            display_name: model.display_name,
            votes: model.votes,
            stars_received: model.stars_received,
            score: model.score,
            created_at: model.created_at,
        }
    }
}
