use crate::database::store::{AttemptCompletion, QuestionBank, QuizStore};
use crate::dto::quiz_dto::SaveAnswerRequest;
use crate::error::{Error, Result};
use crate::models::justification::QuestionJustification;
use crate::models::quiz_attempt::{AttemptStatusSnapshot, QuizAttempt};
use crate::models::quiz_results::QuizResults;
use crate::models::user_answer::{NewUserAnswer, UserAnswer};
use crate::models::xp_entry::NewXpEntry;
use crate::services::scoring_service::ScoringService;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    question_bank: Arc<dyn QuestionBank>,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>, question_bank: Arc<dyn QuestionBank>) -> Self {
        Self {
            store,
            question_bank,
        }
    }

    pub async fn create_attempt(&self, quiz_id: Uuid, user_id: Uuid) -> Result<QuizAttempt> {
        let attempt = QuizAttempt::new(quiz_id, user_id, Utc::now());
        let created = self.store.insert_attempt(&attempt).await?;
        info!(attempt_id = %created.id, %quiz_id, %user_id, "quiz attempt started");
        Ok(created)
    }

    pub async fn get_attempt(&self, attempt_id: Uuid) -> Result<QuizAttempt> {
        self.store.get_attempt(attempt_id).await
    }

    /// Loads an attempt on behalf of `user_id`. Attempts of other users are reported as missing.
    pub async fn get_owned_attempt(&self, attempt_id: Uuid, user_id: Uuid) -> Result<QuizAttempt> {
        let attempt = self.store.get_attempt(attempt_id).await?;
        if attempt.user_id != user_id {
            return Err(Error::NotFound(format!("Quiz attempt {} not found", attempt_id)));
        }
        Ok(attempt)
    }

    /// Records one answer and returns the correctness that was stored for it.
    pub async fn save_answer(&self, attempt_id: Uuid, req: SaveAnswerRequest) -> Result<bool> {
        ensure_non_negative_time(req.time_spent)?;
        let attempt = self.store.get_attempt(attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let is_correct = if req.correct_options.is_empty() {
            req.is_correct
        } else {
            let computed = ScoringService::options_match(&req.selected_options, &req.correct_options);
            if computed != req.is_correct {
                warn!(
                    %attempt_id,
                    question_id = %req.question_id,
                    reported = req.is_correct,
                    computed,
                    "caller correctness disagrees with option comparison; storing computed value"
                );
            }
            computed
        };

        let (updated, _) = self
            .store
            .record_answer(&NewUserAnswer {
                attempt_id,
                question_id: req.question_id,
                selected_options: req.selected_options,
                is_correct,
                time_taken: req.time_spent,
            })
            .await?;

        debug!(
            %attempt_id,
            question_id = %req.question_id,
            current_question_index = updated.current_question_index,
            "answer recorded"
        );
        Ok(is_correct)
    }

    pub async fn update_attempt_progress(
        &self,
        attempt_id: Uuid,
        time_spent: i32,
        current_question_index: i32,
    ) -> Result<QuizAttempt> {
        ensure_non_negative_time(time_spent)?;
        if current_question_index < 0 {
            return Err(Error::BadRequest(
                "current_question_index must not be negative".to_string(),
            ));
        }
        self.store
            .update_progress(attempt_id, time_spent, current_question_index)
            .await
    }

    /// Scores the attempt, marks it completed and credits XP in one commit.
    /// A second call fails with `Conflict` and awards nothing.
    pub async fn finish_quiz(&self, attempt_id: Uuid) -> Result<QuizResults> {
        let attempt = self.store.get_attempt(attempt_id).await?;
        ensure_in_progress(&attempt)?;

        let results = ScoringService::compute(&attempt.answers, attempt.time_spent, Utc::now());
        let completion = AttemptCompletion {
            score: results.score,
            end_time: results.completed_at,
            xp: NewXpEntry {
                user_id: attempt.user_id,
                xp_gained: results.xp_gained,
                quiz_id: attempt.quiz_id,
                attempt_id,
            },
        };
        self.store.complete_attempt(attempt_id, &completion).await?;

        info!(
            %attempt_id,
            score = results.score,
            xp_gained = results.xp_gained,
            status = ?results.status,
            "quiz attempt completed"
        );
        Ok(results)
    }

    pub async fn get_attempt_status(&self, attempt_id: Uuid) -> Result<AttemptStatusSnapshot> {
        let attempt = self.store.get_attempt(attempt_id).await?;
        let total_questions = self.question_bank.count_for_quiz(attempt.quiz_id).await?;
        let answered_questions = attempt.answers.len() as i64;

        let progress_percent = if total_questions > 0 {
            (answered_questions as f64 / total_questions as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        Ok(AttemptStatusSnapshot {
            attempt_id,
            status: attempt.status,
            answered_questions,
            total_questions,
            progress_percent,
            time_spent: attempt.time_spent,
            current_question_index: attempt.current_question_index,
            score: if attempt.is_completed() { attempt.score } else { None },
        })
    }

    pub async fn get_best_attempt(&self, quiz_id: Uuid, user_id: Uuid) -> Result<Option<QuizAttempt>> {
        self.store.best_completed_attempt(quiz_id, user_id).await
    }

    /// Drops every in-progress attempt for the pair and starts a fresh one.
    pub async fn reset_attempt(&self, quiz_id: Uuid, user_id: Uuid) -> Result<QuizAttempt> {
        let discarded = self.store.delete_in_progress(quiz_id, user_id).await?;
        if discarded > 0 {
            info!(%quiz_id, %user_id, discarded, "in-progress attempts discarded");
        }
        self.create_attempt(quiz_id, user_id).await
    }

    pub async fn save_justification(
        &self,
        question_id: Uuid,
        justification: &str,
    ) -> Result<QuestionJustification> {
        self.store.upsert_justification(question_id, justification).await
    }

    pub async fn list_attempt_answers(&self, attempt_id: Uuid) -> Result<Vec<UserAnswer>> {
        self.store.list_user_answers(attempt_id).await
    }

    pub async fn expire_stale_attempts(&self, ttl: Duration) -> Result<u64> {
        let idle_since = Utc::now() - ttl;
        let removed = self.store.delete_stale_attempts(idle_since).await?;
        if removed > 0 {
            info!(removed, %idle_since, "stale in-progress attempts expired");
        }
        Ok(removed)
    }
}

fn ensure_non_negative_time(time_spent: i32) -> Result<()> {
    if time_spent < 0 {
        return Err(Error::BadRequest("time_spent must not be negative".to_string()));
    }
    Ok(())
}

fn ensure_in_progress(attempt: &QuizAttempt) -> Result<()> {
    if attempt.is_completed() {
        return Err(Error::Conflict("attempt_already_completed".to_string()));
    }
    Ok(())
}
