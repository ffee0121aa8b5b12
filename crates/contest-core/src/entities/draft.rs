//! Creation wizard - tagged-state machine for composing a contest
//!
//! A draft is never a live contest. Each state carries exactly the data
//! gathered so far, and [`DraftState::step`] is the single place where
//! legal transitions are decided.

use serde::{Deserialize, Serialize};

use super::contest::{validate_text, validate_winner_count, ContestKind, NewContest};
use super::gate::GateSpec;
use crate::error::DomainError;
use crate::value_objects::{ChatId, ContestFlags, UserId};

/// Maximum number of gates per contest
pub const MAX_GATES: usize = 10;

/// Destination chosen in the channel step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub channel_id: ChatId,
    pub group_id: Option<ChatId>,
}

/// Fully composed contest awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestDraft {
    pub kind: ContestKind,
    pub destination: Destination,
    pub text: String,
    pub gates: Vec<GateSpec>,
    pub winner_count: u32,
    pub flags: ContestFlags,
}

impl ContestDraft {
    pub fn has_premium_gates(&self) -> bool {
        self.gates.iter().any(|g| g.kind.is_premium())
    }

    pub fn into_new_contest(self, owner_id: UserId, code: String) -> (NewContest, Vec<GateSpec>) {
        let contest = NewContest {
            owner_id,
            channel_id: self.destination.channel_id,
            group_id: self.destination.group_id,
            code,
            kind: self.kind,
            text: self.text,
            winner_count: self.winner_count,
            flags: self.flags,
        };
        (contest, self.gates)
    }
}

/// Wizard state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DraftState {
    #[default]
    ChoosingKind,
    ChoosingChannel {
        kind: ContestKind,
    },
    ComposingText {
        kind: ContestKind,
        destination: Destination,
    },
    ChoosingGates {
        kind: ContestKind,
        destination: Destination,
        text: String,
        gates: Vec<GateSpec>,
    },
    ChoosingWinners {
        kind: ContestKind,
        destination: Destination,
        text: String,
        gates: Vec<GateSpec>,
    },
    Confirming {
        draft: ContestDraft,
    },
}

/// Input delivered to the wizard by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftInput {
    Kind(ContestKind),
    Channel(Destination),
    Text(String),
    AddGate(GateSpec),
    RemoveGate(usize),
    FinishGates,
    Winners(u32),
    ToggleFlag(ContestFlags),
    Back,
}

impl DraftInput {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kind(_) => "kind",
            Self::Channel(_) => "channel",
            Self::Text(_) => "text",
            Self::AddGate(_) => "add_gate",
            Self::RemoveGate(_) => "remove_gate",
            Self::FinishGates => "finish_gates",
            Self::Winners(_) => "winners",
            Self::ToggleFlag(_) => "toggle_flag",
            Self::Back => "back",
        }
    }
}

impl DraftState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChoosingKind => "choosing_kind",
            Self::ChoosingChannel { .. } => "choosing_channel",
            Self::ComposingText { .. } => "composing_text",
            Self::ChoosingGates { .. } => "choosing_gates",
            Self::ChoosingWinners { .. } => "choosing_winners",
            Self::Confirming { .. } => "confirming",
        }
    }

    /// The composed draft, once the wizard reached confirmation
    pub fn draft(&self) -> Option<&ContestDraft> {
        match self {
            Self::Confirming { draft } => Some(draft),
            _ => None,
        }
    }

    /// Advance the wizard; inputs that make no sense in the current state are rejected
    pub fn step(self, input: DraftInput) -> Result<DraftState, DomainError> {
        use DraftInput as In;

        let state_name = self.name();
        let illegal = |input: &DraftInput| DomainError::IllegalDraftInput {
            state: state_name,
            input: input.name(),
        };

        match (self, input) {
            (Self::ChoosingKind, In::Kind(kind)) => Ok(Self::ChoosingChannel { kind }),

            (Self::ChoosingChannel { kind }, In::Channel(destination)) => {
                if requires_group(&kind) && destination.group_id.is_none() {
                    return Err(DomainError::ValidationError(format!(
                        "{} contests need a discussion group",
                        kind.name()
                    )));
                }
                Ok(Self::ComposingText { kind, destination })
            }
            (Self::ChoosingChannel { .. }, In::Back) => Ok(Self::ChoosingKind),

            (Self::ComposingText { kind, destination }, In::Text(text)) => {
                validate_text(&text)?;
                Ok(Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    gates: Vec::new(),
                })
            }
            (Self::ComposingText { kind, .. }, In::Back) => Ok(Self::ChoosingChannel { kind }),

            (
                Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    mut gates,
                },
                In::AddGate(gate),
            ) => {
                if gates.len() >= MAX_GATES {
                    return Err(DomainError::TooManyGates { max: MAX_GATES });
                }
                if !gates.iter().any(|g| g.kind == gate.kind) {
                    gates.push(gate);
                }
                Ok(Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    gates,
                })
            }
            (
                Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    mut gates,
                },
                In::RemoveGate(index),
            ) => {
                if index < gates.len() {
                    gates.remove(index);
                }
                Ok(Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    gates,
                })
            }
            (
                Self::ChoosingGates {
                    kind,
                    destination,
                    text,
                    gates,
                },
                In::FinishGates,
            ) => Ok(Self::ChoosingWinners {
                kind,
                destination,
                text,
                gates,
            }),
            (
                Self::ChoosingGates {
                    kind, destination, ..
                },
                In::Back,
            ) => Ok(Self::ComposingText { kind, destination }),

            (
                Self::ChoosingWinners {
                    kind,
                    destination,
                    text,
                    gates,
                },
                In::Winners(winner_count),
            ) => {
                validate_winner_count(winner_count)?;
                Ok(Self::Confirming {
                    draft: ContestDraft {
                        kind,
                        destination,
                        text,
                        gates,
                        winner_count,
                        flags: ContestFlags::empty(),
                    },
                })
            }
            (
                Self::ChoosingWinners {
                    kind,
                    destination,
                    text,
                    gates,
                },
                In::Back,
            ) => Ok(Self::ChoosingGates {
                kind,
                destination,
                text,
                gates,
            }),

            (Self::Confirming { mut draft }, In::ToggleFlag(flag)) => {
                draft.flags.toggle(flag);
                Ok(Self::Confirming { draft })
            }
            (Self::Confirming { draft }, In::Back) => Ok(Self::ChoosingWinners {
                kind: draft.kind,
                destination: draft.destination,
                text: draft.text,
                gates: draft.gates,
            }),

            (_, input) => Err(illegal(&input)),
        }
    }
}

fn requires_group(kind: &ContestKind) -> bool {
    matches!(kind, ContestKind::Reaction(_))
}
