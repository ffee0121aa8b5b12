//! Question entity <-> model mapper

use contest_core::entities::Question;
use contest_core::value_objects::{ContestId, QuestionId};

use crate::models::QuestionModel;

impl From<QuestionModel> for Question {
    fn from(model: QuestionModel) -> Self {
        Question {
            id: QuestionId::new(model.id),
            contest_id: model.contest_id.map(ContestId::new),
            text: model.text,
            answers: model.answers.0,
            points: model.points,
        }
    }
}
