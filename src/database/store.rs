use crate::error::Result;
use crate::models::justification::QuestionJustification;
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::quiz_attempt::QuizAttempt;
use crate::models::user_answer::{NewUserAnswer, UserAnswer};
use crate::models::xp_entry::{NewXpEntry, XpEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Final write of an attempt: status, score and the XP ledger entry commit together.
#[derive(Debug, Clone)]
pub struct AttemptCompletion {
    pub score: f64,
    pub end_time: DateTime<Utc>,
    pub xp: NewXpEntry,
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<QuizAttempt>;

    /// Fails with `NotFound` when the attempt does not exist.
    async fn get_attempt(&self, attempt_id: Uuid) -> Result<QuizAttempt>;

    /// Deletes every in-progress attempt of the pair and returns how many were removed.
    async fn delete_in_progress(&self, quiz_id: Uuid, user_id: Uuid) -> Result<u64>;

    /// Upserts the answer at its question id, advances the current index by one,
    /// overwrites the cumulative time spent with `time_taken` and appends the
    /// audit row, as one write. Fails with `Conflict` on a completed attempt.
    async fn record_answer(&self, answer: &NewUserAnswer) -> Result<(QuizAttempt, UserAnswer)>;

    /// Fails with `Conflict` on a completed attempt.
    async fn update_progress(
        &self,
        attempt_id: Uuid,
        time_spent: i32,
        current_question_index: i32,
    ) -> Result<QuizAttempt>;

    /// Fails with `Conflict` when the attempt is no longer in progress; in that
    /// case nothing is written.
    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        completion: &AttemptCompletion,
    ) -> Result<(QuizAttempt, XpEntry)>;

    async fn best_completed_attempt(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<QuizAttempt>>;

    async fn list_user_answers(&self, attempt_id: Uuid) -> Result<Vec<UserAnswer>>;

    async fn upsert_justification(
        &self,
        question_id: Uuid,
        justification: &str,
    ) -> Result<QuestionJustification>;

    /// Deletes in-progress attempts not written since `idle_since`.
    async fn delete_stale_attempts(&self, idle_since: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait QuestionBank: Send + Sync {
    async fn count_for_quiz(&self, quiz_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Payment>;

    /// Matches either the gateway reference or the merchant reference.
    async fn find_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>>;

    async fn update_payment(&self, payment_id: Uuid, patch: &PaymentPatch) -> Result<Payment>;
}
