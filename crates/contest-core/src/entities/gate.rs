//! Gate entity - an extra eligibility condition attached to a contest

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, ContestId};

/// Condition a user must satisfy, with its target reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateKind {
    ChannelMembership { chat_id: ChatId },
    GroupMembership { chat_id: ChatId },
    JoinedContest { contest_id: ContestId },
    VotedForEntry { contest_id: ContestId, entry_code: String },
    InteractionPoints { group_id: ChatId, min_points: i64 },
}

impl GateKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChannelMembership { .. } => "channel_membership",
            Self::GroupMembership { .. } => "group_membership",
            Self::JoinedContest { .. } => "joined_contest",
            Self::VotedForEntry { .. } => "voted_for_entry",
            Self::InteractionPoints { .. } => "interaction_points",
        }
    }

    /// Membership gates are the paid "gate channel" feature
    pub fn is_premium(&self) -> bool {
        matches!(
            self,
            Self::ChannelMembership { .. } | Self::GroupMembership { .. }
        )
    }
}

/// A gate as stored for one contest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub id: i64,
    pub contest_id: ContestId,
    pub kind: GateKind,
    pub title: String,
    pub invite_link: Option<String>,
}

/// A gate chosen in the creation wizard, before the contest exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    pub kind: GateKind,
    pub title: String,
    pub invite_link: Option<String>,
}

impl GateSpec {
    pub fn new(kind: GateKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            invite_link: None,
        }
    }
}
