//! Domain entities - core business objects

mod channel_link;
mod contest;
mod draft;
mod entitlement;
mod entry;
mod gate;
mod purchase;
mod question;
mod user;
mod vote;
mod winner;

pub use channel_link::ChannelLink;
pub use contest::{
    generate_contest_code, validate_contest_code, validate_text, validate_winner_count, Contest,
    ContestKind, ContestStatus, LifecycleAction, NewContest, QuizSettings, ReactionSettings,
    VoteMode, VoteSettings, CONTEST_CODE_LEN, MAX_TEXT_LEN, MAX_WINNERS,
};
pub use draft::{ContestDraft, Destination, DraftInput, DraftState, MAX_GATES};
pub use entitlement::{
    stacked_expiry, Access, EntitlementRecord, GATE_FEATURE, MONTHLY_GRANT_DAYS,
};
pub use entry::{generate_entry_code, validate_entry_code, Entry, NewEntry, ENTRY_CODE_LEN};
pub use gate::{Gate, GateKind, GateSpec};
pub use purchase::{InvoicePayload, NewPurchase, Purchase, PurchaseStatus, STARS_CURRENCY};
pub use question::{NewQuestion, Question};
pub use user::{Applicant, User};
pub use vote::{NewVote, Vote, VoteKind};
pub use winner::Winner;
