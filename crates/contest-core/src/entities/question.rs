//! Quiz question bank entry

use serde::{Deserialize, Serialize};

use crate::value_objects::{ContestId, QuestionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// `None` for questions shared by every quiz
    pub contest_id: Option<ContestId>,
    pub text: String,
    pub answers: Vec<String>,
    pub points: i64,
}

impl Question {
    /// Compare ignoring case and surrounding whitespace
    pub fn accepts(&self, answer: &str) -> bool {
        let answer = normalize_answer(answer);
        !answer.is_empty() && self.answers.iter().any(|a| normalize_answer(a) == answer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub contest_id: Option<ContestId>,
    pub text: String,
    pub answers: Vec<String>,
    pub points: i64,
}

fn normalize_answer(s: &str) -> String {
    s.trim().to_lowercase()
}
