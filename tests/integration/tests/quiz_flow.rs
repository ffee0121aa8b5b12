//! Quiz contest tests
//!
//! The runner posts on a one second interval, so these tests poll the fake
//! platform instead of sleeping for fixed periods.
//!
//! Run with: cargo test -p integration-tests --test quiz_flow

use std::time::Duration;

use contest_core::{Contest, ContestId, ContestKind, DomainError, QuizSettings, UserId};
use contest_service::dto::AddQuestionRequest;
use contest_service::services::{AnswerOutcome, DrawOutcome, DrawService, QuizService};
use contest_service::ServiceError;
use integration_tests::*;

fn question(contest_id: Option<ContestId>, text: &str, answers: &[&str], points: i64) -> AddQuestionRequest {
    AddQuestionRequest {
        contest_id,
        text: text.to_string(),
        answers: answers.iter().map(ToString::to_string).collect(),
        points,
    }
}

async fn quiz_contest(env: &TestEnv) -> Contest {
    let kind = ContestKind::Quiz(QuizSettings {
        question_count: 5,
        interval_secs: 1,
    });
    env.publish(draft(kind, 1)).await.unwrap()
}

/// Wait until the runner posted question `n` in the group
async fn wait_for_question(env: &TestEnv, n: usize) {
    let prefix = format!("Question {n}:");
    let posted = eventually(Duration::from_secs(3), || {
        let found = env
            .platform
            .messages_to(GROUP)
            .iter()
            .any(|m| m.starts_with(&prefix));
        async move { found }
    })
    .await;
    assert!(posted, "question {n} was never posted");
}

#[tokio::test]
async fn test_first_correct_answer_scores() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let quiz = QuizService::new(&env.ctx);
    quiz.add_question(
        OWNER,
        question(Some(contest.id), "Capital of France?", &["Paris"], 3),
    )
    .await
    .unwrap();

    assert_eq!(quiz.start(OWNER, contest.id).await.unwrap(), 1);
    wait_for_question(&env, 1).await;

    let wrong = quiz
        .submit_answer(&applicant(1), contest.id, "Lyon")
        .await
        .unwrap();
    assert_eq!(wrong, AnswerOutcome::Wrong);

    let AnswerOutcome::Correct { entry, points } = quiz
        .submit_answer(&applicant(1), contest.id, "  paris ")
        .await
        .unwrap()
    else {
        panic!("expected the answer to score");
    };
    assert_eq!(points, 3);
    assert_eq!(entry.score, 3);
    assert_eq!(entry.user_id, UserId::new(1));

    let late = quiz
        .submit_answer(&applicant(2), contest.id, "Paris")
        .await
        .unwrap();
    assert_eq!(late, AnswerOutcome::AlreadySolved);
    assert!(env
        .platform
        .messages_to(GROUP)
        .iter()
        .any(|m| m.contains("user1 answered correctly")));
}

#[tokio::test]
async fn test_draw_ranks_by_score_and_stops_runner() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let quiz = QuizService::new(&env.ctx);
    quiz.add_question(OWNER, question(Some(contest.id), "2 + 2?", &["4", "four"], 2))
        .await
        .unwrap();
    quiz.add_question(OWNER, question(Some(contest.id), "3 + 3?", &["6"], 5))
        .await
        .unwrap();

    assert_eq!(quiz.start(OWNER, contest.id).await.unwrap(), 2);
    let running = quiz.start(OWNER, contest.id).await;
    assert!(matches!(running, Err(ServiceError::Conflict(_))));

    wait_for_question(&env, 1).await;
    quiz.submit_answer(&applicant(1), contest.id, "four")
        .await
        .unwrap();

    wait_for_question(&env, 2).await;
    quiz.submit_answer(&applicant(2), contest.id, "6")
        .await
        .unwrap();

    let DrawOutcome::Finalized(result) = DrawService::new(&env.ctx)
        .draw(OWNER, contest.id)
        .await
        .unwrap()
    else {
        panic!("expected the draw to finalize");
    };
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].user_id, UserId::new(2));
    assert!(env.ctx.quiz_runners().get(&contest.id).is_none());

    let after = quiz
        .submit_answer(&applicant(3), contest.id, "6")
        .await
        .unwrap();
    assert_eq!(after, AnswerOutcome::NoActiveQuestion);
}

#[tokio::test]
async fn test_concurrent_starts_run_one_quiz() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let quiz = QuizService::new(&env.ctx);

    let empty = quiz.start(OWNER, contest.id).await;
    assert!(matches!(empty, Err(ServiceError::Validation(_))));
    assert!(env.ctx.quiz_runners().get(&contest.id).is_none());

    quiz.add_question(OWNER, question(Some(contest.id), "1 + 1?", &["2"], 1))
        .await
        .unwrap();

    let (a, b) = tokio::join!(quiz.start(OWNER, contest.id), quiz.start(OWNER, contest.id));
    let started = [&a, &b].iter().filter(|r| matches!(r, Ok(1))).count();
    let refused = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
        .count();
    assert_eq!((started, refused), (1, 1));

    wait_for_question(&env, 1).await;
    let posted = env
        .platform
        .messages_to(GROUP)
        .iter()
        .filter(|m| m.starts_with("Question 1:"))
        .count();
    assert_eq!(posted, 1);
    assert!(QuizService::new(&env.ctx).stop(contest.id));
}

#[tokio::test]
async fn test_answer_without_active_question() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;

    let outcome = QuizService::new(&env.ctx)
        .submit_answer(&applicant(1), contest.id, "Paris")
        .await
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::NoActiveQuestion);
    assert_eq!(env.db.entry_count(contest.id), 0);
}

#[tokio::test]
async fn test_stop_quiz() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let quiz = QuizService::new(&env.ctx);
    quiz.add_question(OWNER, question(Some(contest.id), "Sky colour?", &["blue"], 1))
        .await
        .unwrap();

    quiz.start(OWNER, contest.id).await.unwrap();
    assert!(quiz.stop(contest.id));
    assert!(!quiz.stop(contest.id));
}

#[tokio::test]
async fn test_shared_questions_fill_contest() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let quiz = QuizService::new(&env.ctx);

    let denied = quiz
        .add_question(OWNER, question(None, "Largest ocean?", &["Pacific"], 1))
        .await;
    assert!(matches!(
        denied,
        Err(ServiceError::Domain(DomainError::NotBotAdmin))
    ));

    quiz.add_question(ADMIN, question(None, "Largest ocean?", &["Pacific"], 1))
        .await
        .unwrap();
    assert_eq!(quiz.start(OWNER, contest.id).await.unwrap(), 1);
    quiz.stop(contest.id);
}

#[tokio::test]
async fn test_question_validation_and_permissions() {
    let env = TestEnv::new();
    let contest = quiz_contest(&env).await;
    let raffle = env.publish(raffle_draft(1)).await.unwrap();
    let quiz = QuizService::new(&env.ctx);

    let blank = quiz
        .add_question(OWNER, question(Some(contest.id), "Anything?", &["  "], 1))
        .await;
    assert!(matches!(blank, Err(ServiceError::Validation(_))));

    let points = quiz
        .add_question(OWNER, question(Some(contest.id), "Anything?", &["yes"], 0))
        .await;
    assert!(matches!(points, Err(ServiceError::Validation(_))));

    let stranger = quiz
        .add_question(
            UserId::new(77),
            question(Some(contest.id), "Anything?", &["yes"], 1),
        )
        .await;
    assert!(matches!(
        stranger,
        Err(ServiceError::Domain(DomainError::NotContestOwner))
    ));

    let wrong_kind = quiz
        .add_question(OWNER, question(Some(raffle.id), "Anything?", &["yes"], 1))
        .await;
    assert!(matches!(
        wrong_kind,
        Err(ServiceError::Domain(DomainError::WrongContestKind { .. }))
    ));

    let empty = quiz.start(OWNER, contest.id).await;
    assert!(matches!(empty, Err(ServiceError::Validation(_))));
}
