//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod challenge;
pub mod channel_link;
pub mod contest;
pub mod context;
pub mod draft;
pub mod draw;
pub mod eligibility;
pub mod entitlement;
pub mod error;
pub mod keys;
pub mod payment;
pub mod quiz;
pub mod ratelimit;
pub mod reaction;
pub mod user;
pub mod voting;

// Re-export all services for convenience
pub use challenge::{Challenge, ChallengeResult, ChallengeService};
pub use channel_link::ChannelLinkService;
pub use contest::{ContestService, JoinOutcome};
pub use context::{QuizRunner, ServiceContext, ServiceContextBuilder};
pub use draft::DraftService;
pub use draw::{DrawOutcome, DrawResult, DrawService};
pub use eligibility::{DenyReason, Eligibility, EligibilityService};
pub use entitlement::{AccessDecision, AdminGrant, EntitlementService, Prices};
pub use error::{ServiceError, ServiceResult};
pub use payment::{InvoiceOutcome, PaymentOutcome, PaymentService};
pub use quiz::{AnswerOutcome, QuizService};
pub use ratelimit::RateLimiter;
pub use reaction::ReactionService;
pub use user::UserService;
pub use voting::{VoteOutcome, VotingService};
