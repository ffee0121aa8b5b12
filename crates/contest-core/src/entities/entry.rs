//! Entry entity - a user's participation record in one contest

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::value_objects::{ContestId, EntryId, UserId};

/// Length of the per-entry code
pub const ENTRY_CODE_LEN: usize = 8;

/// Participant (RAFFLE/QUIZ) or registered contestant (VOTE/REACTION)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub contest_id: ContestId,
    pub user_id: UserId,
    pub code: String,
    pub display_name: String,
    pub votes: i64,
    pub stars_received: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub contest_id: ContestId,
    pub user_id: UserId,
    pub code: String,
    pub display_name: String,
}

impl NewEntry {
    /// Build an entry with a freshly generated code
    pub fn new(contest_id: ContestId, user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            contest_id,
            user_id,
            code: generate_entry_code(),
            display_name: display_name.into(),
        }
    }
}

/// Generate an 8-digit upper-case hex entry code
pub fn generate_entry_code() -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;

    format!("{:08X}", OsRng.next_u32())
}

pub fn validate_entry_code(code: &str) -> Result<(), DomainError> {
    if code.len() == ENTRY_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    {
        Ok(())
    } else {
        Err(DomainError::InvalidEntryCode(code.to_string()))
    }
}
