//! Quiz service
//!
//! A background runner posts questions to the contest's chat at a fixed
//! interval and marks the current one as active. The first correct answer
//! to each question wins its points, decided by a set-if-absent marker.

use std::time::Duration;

use contest_core::entities::{
    Applicant, Contest, ContestKind, Entry, NewEntry, NewQuestion, Question, QuizSettings,
};
use contest_core::{ContestId, DomainError, Insertion, QuestionId, UserId};
use dashmap::mapref::entry::Entry as MapEntry;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::AddQuestionRequest;

use super::contest::ContestService;
use super::context::{QuizRunner, ServiceContext};
use super::error::{ServiceError, ServiceResult};
use super::keys;

/// How long a solved marker outlives its question
const SOLVED_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// First correct answer; carries the credited entry
    Correct { entry: Entry, points: i64 },
    Wrong,
    /// Someone else answered first
    AlreadySolved,
    NoActiveQuestion,
}

/// Quiz service
pub struct QuizService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> QuizService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add a question to a contest, or to the shared bank when no contest is given
    ///
    /// Contest questions need the contest's manager; shared ones a bot administrator.
    #[instrument(skip(self, request))]
    pub async fn add_question(
        &self,
        actor: UserId,
        request: AddQuestionRequest,
    ) -> ServiceResult<Question> {
        request.validate()?;
        if request.answers.iter().all(|a| a.trim().is_empty()) {
            return Err(ServiceError::validation("at least one answer is required"));
        }

        match request.contest_id {
            Some(contest_id) => {
                let contests = ContestService::new(self.ctx);
                let contest = contests.get(contest_id).await?;
                contests.require_manager(actor, &contest).await?;
                quiz_settings(&contest)?;
            }
            None if !self.ctx.config().bot.is_admin(actor) => {
                return Err(DomainError::NotBotAdmin.into());
            }
            None => {}
        }

        let question = self
            .ctx
            .question_repo()
            .create(&NewQuestion {
                contest_id: request.contest_id,
                text: request.text,
                answers: request.answers,
                points: request.points,
            })
            .await?;
        info!(question_id = %question.id, contest_id = ?question.contest_id, "Question added");
        Ok(question)
    }

    /// Start posting questions
    #[instrument(skip(self))]
    pub async fn start(&self, actor: UserId, id: ContestId) -> ServiceResult<usize> {
        let contests = ContestService::new(self.ctx);
        let contest = contests.get(id).await?;
        contests.require_manager(actor, &contest).await?;
        let settings = quiz_settings(&contest)?;
        if !contest.accepts_entries() {
            return Err(DomainError::ContestClosed.into());
        }
        // Claim the slot before the first await so concurrent starts see it
        match self.ctx.quiz_runners().entry(id) {
            MapEntry::Occupied(mut slot) => {
                if !slot.get().is_finished() {
                    return Err(ServiceError::conflict("quiz is already running"));
                }
                slot.insert(QuizRunner::Starting);
            }
            MapEntry::Vacant(slot) => {
                slot.insert(QuizRunner::Starting);
            }
        }

        let questions = match self.load_questions(id, &settings).await {
            Ok(questions) => questions,
            Err(e) => {
                self.ctx
                    .quiz_runners()
                    .remove_if(&id, |_, runner| runner.is_starting());
                return Err(e);
            }
        };

        let count = questions.len();
        let ctx = self.ctx.clone();
        let handle = tokio::spawn(run_quiz(ctx, contest, settings, questions));
        match self.ctx.quiz_runners().get_mut(&id) {
            Some(mut runner) if runner.is_starting() => *runner = QuizRunner::Running(handle),
            _ => {
                handle.abort();
                debug!(contest_id = %id, "Quiz stopped while starting");
                return Err(ServiceError::conflict("quiz was stopped while starting"));
            }
        }

        info!(contest_id = %id, questions = count, "Quiz started");
        Ok(count)
    }

    async fn load_questions(
        &self,
        id: ContestId,
        settings: &QuizSettings,
    ) -> ServiceResult<Vec<Question>> {
        let questions = self
            .ctx
            .question_repo()
            .list_for_contest(id, i64::from(settings.question_count))
            .await?;
        if questions.is_empty() {
            return Err(ServiceError::validation("no questions available"));
        }
        Ok(questions)
    }

    /// Stop the runner, if any; returns whether one was running
    pub fn stop(&self, id: ContestId) -> bool {
        match self.ctx.quiz_runners().remove(&id) {
            Some((_, runner)) => {
                runner.abort();
                debug!(contest_id = %id, "Quiz runner stopped");
                true
            }
            None => false,
        }
    }

    /// Answer the active question
    #[instrument(skip(self, applicant, text), fields(user_id = %applicant.id))]
    pub async fn submit_answer(
        &self,
        applicant: &Applicant,
        id: ContestId,
        text: &str,
    ) -> ServiceResult<AnswerOutcome> {
        let contest = ContestService::new(self.ctx).get(id).await?;
        quiz_settings(&contest)?;
        if !contest.accepts_entries() {
            return Ok(AnswerOutcome::NoActiveQuestion);
        }

        let Some(question) = self.active_question(id).await? else {
            return Ok(AnswerOutcome::NoActiveQuestion);
        };
        if !question.accepts(text) {
            return Ok(AnswerOutcome::Wrong);
        }

        let first = self
            .ctx
            .ephemeral()
            .set_nx_ex(
                &keys::quiz_solved(id, question.id),
                &applicant.id.to_string(),
                SOLVED_TTL,
            )
            .await?;
        if !first {
            return Ok(AnswerOutcome::AlreadySolved);
        }

        let new_entry = NewEntry::new(id, applicant.id, applicant.display_name.clone());
        let credited = match self.ctx.entry_repo().join(&new_entry).await {
            Ok(Insertion::Created(entry) | Insertion::Existing(entry)) => {
                self.ctx.entry_repo().add_score(entry.id, question.points).await
            }
            Err(e) => Err(e),
        };
        let entry = match credited {
            Ok(entry) => entry,
            Err(DomainError::ContestClosed) => return Ok(AnswerOutcome::NoActiveQuestion),
            Err(e) => return Err(e.into()),
        };
        info!(contest_id = %id, question_id = %question.id, score = entry.score, "Quiz answer credited");

        let text = format!("{} answered correctly (+{})", entry.display_name, question.points);
        if let Err(e) = self
            .ctx
            .platform()
            .send_message(contest.interaction_chat(), &text)
            .await
        {
            warn!(contest_id = %id, error = %e, "Could not announce quiz answer");
        }

        Ok(AnswerOutcome::Correct {
            points: question.points,
            entry,
        })
    }

    async fn active_question(&self, id: ContestId) -> ServiceResult<Option<Question>> {
        let Some(raw) = self.ctx.ephemeral().get(&keys::quiz_active(id)).await? else {
            return Ok(None);
        };
        let Ok(question_id) = QuestionId::parse(&raw) else {
            warn!(contest_id = %id, value = %raw, "Malformed active question marker");
            return Ok(None);
        };
        Ok(self.ctx.question_repo().find_by_id(question_id).await?)
    }
}

fn quiz_settings(contest: &Contest) -> ServiceResult<QuizSettings> {
    match &contest.kind {
        ContestKind::Quiz(settings) => Ok(settings.clone()),
        other => Err(DomainError::WrongContestKind {
            expected: "quiz",
            actual: other.name(),
        }
        .into()),
    }
}

/// Post each question, stopping once the contest no longer accepts answers
async fn run_quiz(
    ctx: ServiceContext,
    contest: Contest,
    settings: QuizSettings,
    questions: Vec<Question>,
) {
    let interval = Duration::from_secs(settings.interval_secs.max(1));
    let chat = contest.interaction_chat();
    let active_key = keys::quiz_active(contest.id);

    for (index, question) in questions.iter().enumerate() {
        match ctx.contest_repo().find_by_id(contest.id).await {
            Ok(Some(current)) if current.accepts_entries() => {}
            Ok(_) => {
                debug!(contest_id = %contest.id, "Contest no longer open, quiz ends");
                break;
            }
            Err(e) => {
                warn!(contest_id = %contest.id, error = %e, "Quiz status check failed, quiz ends");
                break;
            }
        }

        let text = format!("Question {}: {}", index + 1, question.text);
        if let Err(e) = ctx.platform().send_message(chat, &text).await {
            warn!(contest_id = %contest.id, error = %e, "Could not post quiz question");
        }
        if let Err(e) = ctx
            .ephemeral()
            .set_ex(&active_key, &question.id.to_string(), interval)
            .await
        {
            warn!(contest_id = %contest.id, error = %e, "Could not mark active question");
        }

        tokio::time::sleep(interval).await;
    }

    if let Err(e) = ctx.ephemeral().delete(&active_key).await {
        warn!(contest_id = %contest.id, error = %e, "Could not clear active question");
    }
    ctx.quiz_runners().remove(&contest.id);
    info!(contest_id = %contest.id, "Quiz finished");
}
