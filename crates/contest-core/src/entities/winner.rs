//! Finalized contest result

use crate::value_objects::{ContestId, EntryId, UserId};

/// One winner, in selection (RAFFLE) or ranking order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub contest_id: ContestId,
    /// 1-based position
    pub position: u32,
    pub entry_id: EntryId,
    pub user_id: UserId,
    pub display_name: String,
}
