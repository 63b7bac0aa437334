use std::sync::Arc;

use quiz_backend::database::memory_store::MemoryStore;
use quiz_backend::database::store::QuizStore;
use quiz_backend::database::Stores;
use quiz_backend::dto::quiz_dto::SaveAnswerRequest;
use quiz_backend::error::Error;
use quiz_backend::models::quiz_attempt::AttemptStatus;
use quiz_backend::models::quiz_results::PassStatus;
use quiz_backend::models::user_answer::NewUserAnswer;
use quiz_backend::services::quiz_service::QuizService;
use tokio_test::assert_ok;
use uuid::Uuid;

fn setup() -> (QuizService, Arc<MemoryStore>) {
    let (stores, memory) = Stores::memory();
    let service = QuizService::new(stores.quiz.clone(), stores.questions.clone());
    (service, memory)
}

fn answer(question_id: Uuid, is_correct: bool, time_spent: i32) -> SaveAnswerRequest {
    SaveAnswerRequest {
        question_id,
        selected_options: vec!["a".into()],
        correct_options: vec![],
        time_spent,
        is_correct,
    }
}

/// Starts, answers and finishes an attempt with `correct` of `total` answers right.
async fn finish_with(
    service: &QuizService,
    quiz_id: Uuid,
    user_id: Uuid,
    correct: usize,
    total: usize,
) -> Uuid {
    let attempt = assert_ok!(service.create_attempt(quiz_id, user_id).await);
    for i in 0..total {
        assert_ok!(
            service
                .save_answer(attempt.id, answer(Uuid::new_v4(), i < correct, 0))
                .await
        );
    }
    assert_ok!(service.finish_quiz(attempt.id).await);
    attempt.id
}

#[tokio::test]
async fn new_attempt_starts_empty_and_in_progress() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let attempt = assert_ok!(service.create_attempt(quiz_id, user_id).await);
    assert_eq!(attempt.status, AttemptStatus::InProgress);
    assert_eq!(attempt.current_question_index, 0);
    assert_eq!(attempt.time_spent, 0);
    assert!(attempt.answers.is_empty());
    assert!(attempt.score.is_none());
    assert!(attempt.end_time.is_none());

    let loaded = assert_ok!(service.get_attempt(attempt.id).await);
    assert_eq!(loaded.id, attempt.id);
    assert_eq!(loaded.quiz_id, quiz_id);
    assert_eq!(loaded.user_id, user_id);
}

#[tokio::test]
async fn every_save_advances_the_index_and_last_answer_wins() {
    let (service, _) = setup();
    let attempt = service
        .create_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    service.save_answer(attempt.id, answer(first, false, 5)).await.unwrap();
    service.save_answer(attempt.id, answer(first, true, 9)).await.unwrap();
    service.save_answer(attempt.id, answer(second, true, 14)).await.unwrap();

    let attempt = service.get_attempt(attempt.id).await.unwrap();
    assert_eq!(attempt.current_question_index, 3);
    assert_eq!(attempt.answers.len(), 2);
    assert!(attempt.answers[&first].is_correct);
    assert_eq!(attempt.answers[&first].time_spent, 9);
    // Cumulative time is overwritten, not summed.
    assert_eq!(attempt.time_spent, 14);

    // Every submission is kept in the audit trail.
    let rows = service.list_attempt_answers(attempt.id).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn progress_checkpoint_overwrites_time_and_index() {
    let (service, _) = setup();
    let attempt = service
        .create_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    let updated = service
        .update_attempt_progress(attempt.id, 95, 4)
        .await
        .unwrap();
    assert_eq!(updated.time_spent, 95);
    assert_eq!(updated.current_question_index, 4);

    let updated = service
        .update_attempt_progress(attempt.id, 30, 1)
        .await
        .unwrap();
    assert_eq!(updated.time_spent, 30);
    assert_eq!(updated.current_question_index, 1);
}

#[tokio::test]
async fn finishing_scores_and_credits_xp_exactly_once() {
    let (service, memory) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let attempt = service.create_attempt(quiz_id, user_id).await.unwrap();

    for is_correct in [true, true, true, false] {
        service
            .save_answer(attempt.id, answer(Uuid::new_v4(), is_correct, 0))
            .await
            .unwrap();
    }

    let results = service.finish_quiz(attempt.id).await.unwrap();
    assert_eq!(results.total_questions, 4);
    assert_eq!(results.correct_answers, 3);
    assert_eq!(results.score, 75.0);
    assert_eq!(results.xp_gained, 150);
    assert_eq!(results.status, PassStatus::Passed);

    let stored = service.get_attempt(attempt.id).await.unwrap();
    assert_eq!(stored.status, AttemptStatus::Completed);
    assert_eq!(stored.score, Some(75.0));
    assert!(stored.end_time.is_some());

    let second = service.finish_quiz(attempt.id).await;
    assert!(matches!(second, Err(Error::Conflict(_))));

    let ledger = memory.xp_history_for_user(user_id).await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].xp_gained, 150);
    assert_eq!(ledger[0].attempt_id, attempt.id);
    assert_eq!(ledger[0].quiz_id, quiz_id);
    assert_eq!(ledger[0].source_type, "quiz");
}

#[tokio::test]
async fn time_spent_at_finish_reduces_the_bonus() {
    let (service, memory) = setup();
    let user_id = Uuid::new_v4();
    let attempt = service.create_attempt(Uuid::new_v4(), user_id).await.unwrap();

    for is_correct in [true, true, true, false] {
        service
            .save_answer(attempt.id, answer(Uuid::new_v4(), is_correct, 60))
            .await
            .unwrap();
    }
    service
        .update_attempt_progress(attempt.id, 240, 4)
        .await
        .unwrap();

    let results = service.finish_quiz(attempt.id).await.unwrap();
    assert_eq!(results.score, 75.0);
    assert_eq!(results.xp_gained, 75);
    assert_eq!(memory.xp_history_for_user(user_id).await[0].xp_gained, 75);
}

#[tokio::test]
async fn finishing_without_answers_scores_zero() {
    let (service, memory) = setup();
    let user_id = Uuid::new_v4();
    let attempt = service.create_attempt(Uuid::new_v4(), user_id).await.unwrap();

    let results = service.finish_quiz(attempt.id).await.unwrap();
    assert_eq!(results.total_questions, 0);
    assert_eq!(results.score, 0.0);
    assert_eq!(results.xp_gained, 0);
    assert_eq!(results.status, PassStatus::Failed);
    assert_eq!(memory.xp_history_for_user(user_id).await.len(), 1);
}

#[tokio::test]
async fn completed_attempts_reject_further_answers_and_checkpoints() {
    let (service, _) = setup();
    let attempt_id = finish_with(&service, Uuid::new_v4(), Uuid::new_v4(), 1, 1).await;

    let save = service
        .save_answer(attempt_id, answer(Uuid::new_v4(), true, 3))
        .await;
    assert!(matches!(save, Err(Error::Conflict(_))));

    let progress = service.update_attempt_progress(attempt_id, 10, 2).await;
    assert!(matches!(progress, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn correct_options_override_the_reported_flag() {
    let (service, _) = setup();
    let attempt = service
        .create_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    let question_id = Uuid::new_v4();

    let wrong_but_claimed = SaveAnswerRequest {
        question_id,
        selected_options: vec!["a".into()],
        correct_options: vec!["b".into()],
        time_spent: 4,
        is_correct: true,
    };
    let stored = service.save_answer(attempt.id, wrong_but_claimed).await.unwrap();
    assert!(!stored);

    let right_any_order = SaveAnswerRequest {
        question_id,
        selected_options: vec!["c".into(), "b".into()],
        correct_options: vec!["b".into(), "c".into()],
        time_spent: 8,
        is_correct: false,
    };
    let stored = service.save_answer(attempt.id, right_any_order).await.unwrap();
    assert!(stored);

    let attempt = service.get_attempt(attempt.id).await.unwrap();
    assert!(attempt.answers[&question_id].is_correct);
}

#[tokio::test]
async fn status_reports_progress_against_the_question_bank() {
    let (service, memory) = setup();
    let quiz_id = Uuid::new_v4();
    let questions = memory.seed_questions(quiz_id, 10).await;
    let attempt = service.create_attempt(quiz_id, Uuid::new_v4()).await.unwrap();

    service
        .save_answer(attempt.id, answer(questions[0], true, 10))
        .await
        .unwrap();
    service
        .save_answer(attempt.id, answer(questions[1], false, 25))
        .await
        .unwrap();

    let status = service.get_attempt_status(attempt.id).await.unwrap();
    assert_eq!(status.status, AttemptStatus::InProgress);
    assert_eq!(status.answered_questions, 2);
    assert_eq!(status.total_questions, 10);
    assert_eq!(status.progress_percent, 20.0);
    assert_eq!(status.time_spent, 25);
    assert_eq!(status.current_question_index, 2);
    assert!(status.score.is_none());

    service.finish_quiz(attempt.id).await.unwrap();
    let status = service.get_attempt_status(attempt.id).await.unwrap();
    assert_eq!(status.status, AttemptStatus::Completed);
    assert_eq!(status.score, Some(50.0));
}

#[tokio::test]
async fn status_for_an_empty_bank_reports_zero_progress() {
    let (service, _) = setup();
    let attempt = service
        .create_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    service
        .save_answer(attempt.id, answer(Uuid::new_v4(), true, 1))
        .await
        .unwrap();

    let status = service.get_attempt_status(attempt.id).await.unwrap();
    assert_eq!(status.total_questions, 0);
    assert_eq!(status.progress_percent, 0.0);
}

#[tokio::test]
async fn best_attempt_is_the_highest_completed_score() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    assert!(service
        .get_best_attempt(quiz_id, user_id)
        .await
        .unwrap()
        .is_none());

    finish_with(&service, quiz_id, user_id, 2, 5).await;
    let best_id = finish_with(&service, quiz_id, user_id, 9, 10).await;
    finish_with(&service, quiz_id, user_id, 7, 10).await;
    // In-progress attempts and other users never count.
    service.create_attempt(quiz_id, user_id).await.unwrap();
    finish_with(&service, quiz_id, Uuid::new_v4(), 10, 10).await;

    let best = service
        .get_best_attempt(quiz_id, user_id)
        .await
        .unwrap()
        .expect("a completed attempt");
    assert_eq!(best.id, best_id);
    assert_eq!(best.score, Some(90.0));
}

#[tokio::test]
async fn reset_discards_the_in_progress_attempt() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let old = service.create_attempt(quiz_id, user_id).await.unwrap();
    service
        .save_answer(old.id, answer(Uuid::new_v4(), true, 12))
        .await
        .unwrap();

    let fresh = service.reset_attempt(quiz_id, user_id).await.unwrap();
    assert_ne!(fresh.id, old.id);
    assert_eq!(fresh.status, AttemptStatus::InProgress);
    assert_eq!(fresh.current_question_index, 0);
    assert_eq!(fresh.time_spent, 0);
    assert!(fresh.answers.is_empty());

    assert!(matches!(
        service.get_attempt(old.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(service.list_attempt_answers(old.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reset_discards_every_in_progress_attempt_of_the_pair() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let older = service.create_attempt(quiz_id, user_id).await.unwrap();
    let newer = service.create_attempt(quiz_id, user_id).await.unwrap();
    let other_quiz = service.create_attempt(Uuid::new_v4(), user_id).await.unwrap();

    let fresh = service.reset_attempt(quiz_id, user_id).await.unwrap();

    for stale in [older.id, newer.id] {
        assert!(matches!(
            service.get_attempt(stale).await,
            Err(Error::NotFound(_))
        ));
    }
    assert_ok!(service.get_attempt(fresh.id).await);
    assert_ok!(service.get_attempt(other_quiz.id).await);
}

#[tokio::test]
async fn reset_keeps_completed_attempts() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let completed = finish_with(&service, quiz_id, user_id, 3, 4).await;

    let fresh = service.reset_attempt(quiz_id, user_id).await.unwrap();
    assert_ne!(fresh.id, completed);
    assert_ok!(service.get_attempt(completed).await);
}

#[tokio::test]
async fn attempts_are_scoped_to_their_owner() {
    let (service, _) = setup();
    let owner = Uuid::new_v4();
    let attempt = service.create_attempt(Uuid::new_v4(), owner).await.unwrap();

    assert_ok!(service.get_owned_attempt(attempt.id, owner).await);
    assert!(matches!(
        service.get_owned_attempt(attempt.id, Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        service.get_attempt(Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn justification_upsert_keeps_the_latest_text() {
    let (service, memory) = setup();
    let question_id = Uuid::new_v4();

    service
        .save_justification(question_id, "first draft")
        .await
        .unwrap();
    let saved = service
        .save_justification(question_id, "Option B follows from the definition.")
        .await
        .unwrap();
    assert_eq!(saved.question_id, question_id);

    let stored = memory.justification(question_id).await.expect("stored");
    assert_eq!(stored.justification, "Option B follows from the definition.");
}

#[tokio::test]
async fn stale_sweep_removes_only_idle_in_progress_attempts() {
    let (service, _) = setup();
    let quiz_id = Uuid::new_v4();
    let idle = service.create_attempt(quiz_id, Uuid::new_v4()).await.unwrap();
    let completed = finish_with(&service, quiz_id, Uuid::new_v4(), 1, 2).await;

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let active = service.create_attempt(quiz_id, Uuid::new_v4()).await.unwrap();

    let removed = service
        .expire_stale_attempts(chrono::Duration::milliseconds(150))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    assert!(matches!(
        service.get_attempt(idle.id).await,
        Err(Error::NotFound(_))
    ));
    assert_ok!(service.get_attempt(completed).await);
    assert_ok!(service.get_attempt(active.id).await);
}

#[tokio::test]
async fn negative_time_is_rejected_before_anything_is_written() {
    let (service, _) = setup();
    let attempt = service
        .create_attempt(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    let save = service
        .save_answer(attempt.id, answer(Uuid::new_v4(), true, -600))
        .await;
    assert!(matches!(save, Err(Error::BadRequest(_))));

    let progress = service.update_attempt_progress(attempt.id, -1, 0).await;
    assert!(matches!(progress, Err(Error::BadRequest(_))));
    let progress = service.update_attempt_progress(attempt.id, 10, -1).await;
    assert!(matches!(progress, Err(Error::BadRequest(_))));

    let stored = service.get_attempt(attempt.id).await.unwrap();
    assert!(stored.answers.is_empty());
    assert_eq!(stored.current_question_index, 0);
    assert_eq!(stored.time_spent, 0);
    assert!(service.list_attempt_answers(attempt.id).await.unwrap().is_empty());

    service
        .save_answer(attempt.id, answer(Uuid::new_v4(), true, 0))
        .await
        .unwrap();
    let results = service.finish_quiz(attempt.id).await.unwrap();
    assert_eq!(results.xp_gained, 200);
}

#[tokio::test]
async fn store_refuses_writes_to_a_completed_attempt() {
    let (service, memory) = setup();
    let attempt_id = finish_with(&service, Uuid::new_v4(), Uuid::new_v4(), 2, 3).await;
    let before = service.get_attempt(attempt_id).await.unwrap();

    // Writes that passed the service's status read before the attempt was finished.
    let late_answer = NewUserAnswer {
        attempt_id,
        question_id: Uuid::new_v4(),
        selected_options: vec!["a".into()],
        is_correct: true,
        time_taken: 99,
    };
    assert!(matches!(
        memory.record_answer(&late_answer).await,
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        memory.update_progress(attempt_id, 500, 9).await,
        Err(Error::Conflict(_))
    ));

    let after = service.get_attempt(attempt_id).await.unwrap();
    assert_eq!(after.answers, before.answers);
    assert_eq!(after.current_question_index, before.current_question_index);
    assert_eq!(after.time_spent, before.time_spent);
    assert_eq!(after.score, before.score);
    assert_eq!(service.list_attempt_answers(attempt_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn answers_for_a_missing_attempt_leave_no_audit_row() {
    let (_, memory) = setup();
    let attempt_id = Uuid::new_v4();

    let result = memory
        .record_answer(&NewUserAnswer {
            attempt_id,
            question_id: Uuid::new_v4(),
            selected_options: vec!["a".into()],
            is_correct: false,
            time_taken: 5,
        })
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(memory.list_user_answers(attempt_id).await.unwrap().is_empty());
}
