//! Data transfer objects for transport-layer requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for incoming inputs
//! - Response DTOs for serializing outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{AddQuestionRequest, ConfirmPaymentRequest};

pub use responses::{ContestResponse, EntitlementStatusResponse, EntryResponse, WinnerResponse};
