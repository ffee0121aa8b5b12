//! PostgreSQL implementation of QuestionRepository

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use contest_core::entities::{NewQuestion, Question};
use contest_core::traits::{QuestionRepository, RepoResult};
use contest_core::value_objects::{ContestId, QuestionId};

use crate::models::QuestionModel;

use super::error::map_db_error;

/// PostgreSQL implementation of QuestionRepository
#[derive(Clone)]
pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    /// Create a new PgQuestionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    #[instrument(skip(self, question), fields(contest_id = ?question.contest_id))]
    async fn create(&self, question: &NewQuestion) -> RepoResult<Question> {
        let model = sqlx::query_as::<_, QuestionModel>(
            r"
            INSERT INTO questions (contest_id, text, answers, points)
            VALUES ($1, $2, $3, $4)
            RETURNING id, contest_id, text, answers, points
            ",
        )
        .bind(question.contest_id.map(ContestId::into_inner))
        .bind(&question.text)
        .bind(Json(&question.answers))
        .bind(question.points)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Question::from(model))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        let result = sqlx::query_as::<_, QuestionModel>(
            r"
            SELECT id, contest_id, text, answers, points
            FROM questions
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Question::from))
    }

    #[instrument(skip(self))]
    async fn list_for_contest(&self, contest_id: ContestId, limit: i64) -> RepoResult<Vec<Question>> {
        let results = sqlx::query_as::<_, QuestionModel>(
            r"
            SELECT id, contest_id, text, answers, points
            FROM questions
            WHERE contest_id = $1 OR contest_id IS NULL
            ORDER BY (contest_id IS NULL), id
            LIMIT $2
            ",
        )
        .bind(contest_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Question::from).collect())
    }
}
