//! Database models - SQLx-compatible structs for PostgreSQL tables

mod contest;
mod entitlement;
mod entry;
mod purchase;
mod question;
mod user;

pub use contest::{ContestModel, GateModel, WinnerModel};
pub use entitlement::EntitlementModel;
pub use entry::EntryModel;
pub use purchase::PurchaseModel;
pub use question::QuestionModel;
pub use user::{ChannelLinkModel, UserModel};
