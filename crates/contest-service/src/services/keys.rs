//! Ephemeral store key layout
//!
//! The store adds its own namespace prefix; these are the keys below it.

use contest_core::{ContestId, QuestionId, UserId};

/// Creation wizard state of an owner
pub fn draft(owner: UserId) -> String {
    format!("draft:{owner}")
}

/// Pending arithmetic challenge
pub fn challenge(contest: ContestId, user: UserId) -> String {
    format!("challenge:{contest}:{user}")
}

/// Marker set once a user solved the challenge for a contest
pub fn challenge_passed(contest: ContestId, user: UserId) -> String {
    format!("challenge:{contest}:{user}:passed")
}

/// Question currently asked in a quiz
pub fn quiz_active(contest: ContestId) -> String {
    format!("quiz:{contest}:active")
}

/// First correct answer to a quiz question
pub fn quiz_solved(contest: ContestId, question: QuestionId) -> String {
    format!("quiz:{contest}:solved:{question}")
}

/// Rate-limit window of a user for one action
pub fn rate(action: &str, user: UserId) -> String {
    format!("rate:{action}:{user}")
}
