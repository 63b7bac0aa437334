use crate::database::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::database::store::{AttemptCompletion, PaymentStore, QuestionBank, QuizStore};
use crate::error::{Error, Result};
use crate::models::justification::QuestionJustification;
use crate::models::payment::{Payment, PaymentFlow, PaymentPatch, PaymentStatus};
use crate::models::quiz_attempt::{AnswerMap, AttemptStatus, QuizAttempt};
use crate::models::user_answer::{NewUserAnswer, UserAnswer};
use crate::models::xp_entry::{XpEntry, QUIZ_SOURCE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct AttemptRow {
    id: Uuid,
    quiz_id: Uuid,
    user_id: Uuid,
    status: String,
    current_question_index: i32,
    time_spent: i32,
    answers: Json<AnswerMap>,
    score: Option<Decimal>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for QuizAttempt {
    type Error = Error;

    fn try_from(row: AttemptRow) -> Result<Self> {
        Ok(QuizAttempt {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            status: row.status.parse::<AttemptStatus>().map_err(Error::Internal)?,
            current_question_index: row.current_question_index,
            time_spent: row.time_spent,
            answers: row.answers.0,
            score: row.score.and_then(|s| s.to_f64()),
            start_time: row.start_time,
            end_time: row.end_time,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    purpose: String,
    amount: i64,
    currency: String,
    email: Option<String>,
    phone: Option<String>,
    channel: Option<String>,
    merchant_reference: String,
    gateway_reference: Option<String>,
    checkout_url: Option<String>,
    status: String,
    flow: Option<String>,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Payment {
            id: row.id,
            user_id: row.user_id,
            purpose: row.purpose,
            amount: row.amount,
            currency: row.currency,
            email: row.email,
            phone: row.phone,
            channel: row.channel,
            merchant_reference: row.merchant_reference,
            gateway_reference: row.gateway_reference,
            checkout_url: row.checkout_url,
            status: row.status.parse::<PaymentStatus>().map_err(Error::Internal)?,
            flow: row
                .flow
                .map(|f| f.parse::<PaymentFlow>())
                .transpose()
                .map_err(Error::Internal)?,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgStore {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    /// Explains why a write conditioned on `status = 'in_progress'` matched no row.
    async fn rejected_write(&self, attempt_id: Uuid) -> Error {
        let exists = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM quiz_attempts WHERE id = $1"#)
            .bind(attempt_id)
            .fetch_one(&self.pool)
            .await;
        match exists {
            Ok(0) => Error::NotFound(format!("Quiz attempt {} not found", attempt_id)),
            Ok(_) => Error::Conflict("attempt_already_completed".to_string()),
            Err(e) => Error::from(e),
        }
    }

    fn publish_attempt(&self, kind: ChangeKind, attempt: &QuizAttempt) {
        self.feed
            .publish(ChangeEvent::new(Table::QuizAttempts, kind, attempt.id, attempt));
    }
}

fn score_to_decimal(score: f64) -> Decimal {
    Decimal::from_f64(score).unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl QuizStore for PgStore {
    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<QuizAttempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            INSERT INTO quiz_attempts (
                id, quiz_id, user_id, status, current_question_index, time_spent,
                answers, score, start_time, end_time, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, NULL, $9)
            RETURNING *
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.quiz_id)
        .bind(attempt.user_id)
        .bind(attempt.status.as_str())
        .bind(attempt.current_question_index)
        .bind(attempt.time_spent)
        .bind(Json(&attempt.answers))
        .bind(attempt.start_time)
        .bind(attempt.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let created = QuizAttempt::try_from(row)?;
        self.publish_attempt(ChangeKind::Insert, &created);
        Ok(created)
    }

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<QuizAttempt> {
        let row = sqlx::query_as::<_, AttemptRow>(r#"SELECT * FROM quiz_attempts WHERE id = $1"#)
            .bind(attempt_id)
            .fetch_one(&self.pool)
            .await?;
        QuizAttempt::try_from(row)
    }

    async fn delete_in_progress(&self, quiz_id: Uuid, user_id: Uuid) -> Result<u64> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            DELETE FROM quiz_attempts
            WHERE quiz_id = $1 AND user_id = $2 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let count = rows.len() as u64;
        for row in rows {
            let removed = QuizAttempt::try_from(row)?;
            self.publish_attempt(ChangeKind::Delete, &removed);
        }
        Ok(count)
    }

    async fn record_answer(&self, answer: &NewUserAnswer) -> Result<(QuizAttempt, UserAnswer)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE quiz_attempts
            SET answers = answers || jsonb_build_object($2::text, $3::jsonb),
                current_question_index = current_question_index + 1,
                time_spent = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(answer.attempt_id)
        .bind(answer.question_id.to_string())
        .bind(Json(answer.recorded()))
        .bind(answer.time_taken)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(self.rejected_write(answer.attempt_id).await);
        };

        let audit = sqlx::query_as::<_, UserAnswer>(
            r#"
            INSERT INTO user_answers (attempt_id, question_id, selected_options, is_correct, time_taken)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(answer.attempt_id)
        .bind(answer.question_id)
        .bind(&answer.selected_options)
        .bind(answer.is_correct)
        .bind(answer.time_taken)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let updated = QuizAttempt::try_from(row)?;
        self.feed.publish(ChangeEvent::new(
            Table::UserAnswers,
            ChangeKind::Insert,
            audit.id,
            &audit,
        ));
        self.publish_attempt(ChangeKind::Update, &updated);
        Ok((updated, audit))
    }

    async fn update_progress(
        &self,
        attempt_id: Uuid,
        time_spent: i32,
        current_question_index: i32,
    ) -> Result<QuizAttempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE quiz_attempts
            SET time_spent = $2, current_question_index = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(time_spent)
        .bind(current_question_index)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(self.rejected_write(attempt_id).await);
        };

        let updated = QuizAttempt::try_from(row)?;
        self.publish_attempt(ChangeKind::Update, &updated);
        Ok(updated)
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        completion: &AttemptCompletion,
    ) -> Result<(QuizAttempt, XpEntry)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE quiz_attempts
            SET status = 'completed', score = $2, end_time = $3, updated_at = $3
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(score_to_decimal(completion.score))
        .bind(completion.end_time)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(self.rejected_write(attempt_id).await);
        };

        let entry = sqlx::query_as::<_, XpEntry>(
            r#"
            INSERT INTO xp_history (user_id, xp_gained, source_type, source_id, quiz_id, attempt_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(completion.xp.user_id)
        .bind(completion.xp.xp_gained)
        .bind(QUIZ_SOURCE)
        .bind(completion.xp.quiz_id)
        .bind(completion.xp.quiz_id)
        .bind(completion.xp.attempt_id)
        .bind(completion.end_time)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let completed = QuizAttempt::try_from(row)?;
        self.publish_attempt(ChangeKind::Update, &completed);
        self.feed.publish(ChangeEvent::new(
            Table::XpHistory,
            ChangeKind::Insert,
            entry.id,
            &entry,
        ));
        Ok((completed, entry))
    }

    async fn best_completed_attempt(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<QuizAttempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM quiz_attempts
            WHERE quiz_id = $1 AND user_id = $2 AND status = 'completed' AND score IS NOT NULL
            ORDER BY score DESC, end_time ASC
            LIMIT 1
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QuizAttempt::try_from).transpose()
    }

    async fn list_user_answers(&self, attempt_id: Uuid) -> Result<Vec<UserAnswer>> {
        let rows = sqlx::query_as::<_, UserAnswer>(
            r#"SELECT * FROM user_answers WHERE attempt_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_justification(
        &self,
        question_id: Uuid,
        justification: &str,
    ) -> Result<QuestionJustification> {
        let row = sqlx::query_as::<_, QuestionJustification>(
            r#"
            INSERT INTO question_justifications (question_id, justification, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (question_id)
            DO UPDATE SET justification = EXCLUDED.justification, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(question_id)
        .bind(justification)
        .fetch_one(&self.pool)
        .await?;

        self.feed.publish(ChangeEvent::new(
            Table::QuestionJustifications,
            ChangeKind::Update,
            question_id,
            &row,
        ));
        Ok(row)
    }

    async fn delete_stale_attempts(&self, idle_since: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            DELETE FROM quiz_attempts
            WHERE status = 'in_progress' AND updated_at < $1
            RETURNING *
            "#,
        )
        .bind(idle_since)
        .fetch_all(&self.pool)
        .await?;

        let count = rows.len() as u64;
        for row in rows {
            let removed = QuizAttempt::try_from(row)?;
            self.publish_attempt(ChangeKind::Delete, &removed);
        }
        Ok(count)
    }
}

#[async_trait]
impl QuestionBank for PgStore {
    async fn count_for_quiz(&self, quiz_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM quiz_questions WHERE quiz_id = $1"#)
                .bind(quiz_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl PaymentStore for PgStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (
                id, user_id, purpose, amount, currency, email, phone, channel,
                merchant_reference, gateway_reference, checkout_url, status, flow, message,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(&payment.purpose)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.email)
        .bind(&payment.phone)
        .bind(&payment.channel)
        .bind(&payment.merchant_reference)
        .bind(&payment.gateway_reference)
        .bind(&payment.checkout_url)
        .bind(payment.status.as_str())
        .bind(payment.flow.map(|f| f.as_str()))
        .bind(&payment.message)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let created = Payment::try_from(row)?;
        self.feed.publish(ChangeEvent::new(
            Table::Payments,
            ChangeKind::Insert,
            created.id,
            &created,
        ));
        Ok(created)
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(r#"SELECT * FROM payments WHERE id = $1"#)
            .bind(payment_id)
            .fetch_one(&self.pool)
            .await?;
        Payment::try_from(row)
    }

    async fn find_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT * FROM payments
            WHERE gateway_reference = $1 OR merchant_reference = $1
            LIMIT 1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Payment::try_from).transpose()
    }

    async fn update_payment(&self, payment_id: Uuid, patch: &PaymentPatch) -> Result<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            UPDATE payments
            SET status = COALESCE($2, status),
                gateway_reference = COALESCE($3, gateway_reference),
                checkout_url = COALESCE($4, checkout_url),
                flow = COALESCE($5, flow),
                message = COALESCE($6, message),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.gateway_reference)
        .bind(&patch.checkout_url)
        .bind(patch.flow.map(|f| f.as_str()))
        .bind(&patch.message)
        .fetch_one(&self.pool)
        .await?;

        let updated = Payment::try_from(row)?;
        self.feed.publish(ChangeEvent::new(
            Table::Payments,
            ChangeKind::Update,
            payment_id,
            &updated,
        ));
        Ok(updated)
    }
}
