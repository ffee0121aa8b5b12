//! Request DTOs for inputs arriving from the transport layer
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use contest_core::{ContestId, UserId};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Quiz Requests
// ============================================================================

/// Add a quiz question
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddQuestionRequest {
    /// `None` adds the question to the shared bank
    pub contest_id: Option<ContestId>,

    #[validate(length(min = 1, max = 1024, message = "Question must be 1-1024 characters"))]
    pub text: String,

    #[validate(length(min = 1, max = 20, message = "Between 1 and 20 accepted answers"))]
    pub answers: Vec<String>,

    #[validate(range(min = 1, max = 100, message = "Points must be 1-100"))]
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

// ============================================================================
// Payment Requests
// ============================================================================

/// Successful payment reported by the platform
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    pub user_id: UserId,

    #[validate(length(min = 1, max = 128, message = "Payload must be 1-128 characters"))]
    pub payload: String,

    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount: i64,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}
