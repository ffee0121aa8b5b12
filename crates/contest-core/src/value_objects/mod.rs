//! Value objects - immutable types that represent domain concepts

mod flags;
mod ids;

pub use flags::ContestFlags;
pub use ids::{ChatId, ContestId, EntryId, IdParseError, MessageId, QuestionId, UserId};
