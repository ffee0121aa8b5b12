//! Quiz question database model

use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for questions table
#[derive(Debug, Clone, FromRow)]
pub struct QuestionModel {
    pub id: i64,
    pub contest_id: Option<i64>,
    pub text: String,
    pub answers: Json<Vec<String>>,
    pub points: i64,
}
