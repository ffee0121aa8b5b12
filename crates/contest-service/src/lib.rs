//! # contest-service
//!
//! Application layer: contest lifecycle, eligibility, entitlements, voting,
//! draws and quizzes, orchestrated over the ports of `contest-core`.

pub mod dto;
pub mod services;

pub use services::{
    ContestService, DrawService, EntitlementService, PaymentService, QuizService,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, VotingService,
};
