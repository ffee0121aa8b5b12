//! Deterministic ranking for vote, reaction and quiz contests

use crate::entities::{ContestKind, Entry};

/// Counter a contest kind is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Votes,
    Score,
}

impl RankBy {
    /// `None` for kinds decided by random draw
    pub fn for_kind(kind: &ContestKind) -> Option<Self> {
        match kind {
            ContestKind::Vote(_) | ContestKind::Reaction(_) => Some(Self::Votes),
            ContestKind::Quiz(_) => Some(Self::Score),
            ContestKind::Raffle => None,
        }
    }

    fn key(self, entry: &Entry) -> i64 {
        match self {
            Self::Votes => entry.votes,
            Self::Score => entry.score,
        }
    }
}

/// Top `limit` entries, highest first; ties go to the earliest registration
pub fn rank(mut entries: Vec<Entry>, by: RankBy, limit: usize) -> Vec<Entry> {
    entries.sort_by(|a, b| by.key(b).cmp(&by.key(a)).then(a.id.cmp(&b.id)));
    entries.truncate(limit);
    entries
}
