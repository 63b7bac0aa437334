use crate::database::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::database::store::{AttemptCompletion, PaymentStore, QuestionBank, QuizStore};
use crate::error::{Error, Result};
use crate::models::justification::QuestionJustification;
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::quiz_attempt::{AttemptStatus, QuizAttempt};
use crate::models::user_answer::{NewUserAnswer, UserAnswer};
use crate::models::xp_entry::XpEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    attempts: HashMap<Uuid, QuizAttempt>,
    user_answers: Vec<UserAnswer>,
    xp_history: Vec<XpEntry>,
    quiz_questions: HashMap<Uuid, Vec<Uuid>>,
    justifications: HashMap<Uuid, QuestionJustification>,
    payments: HashMap<Uuid, Payment>,
}

/// Store kept entirely in process memory. Every write happens under one lock,
/// so multi-step writes are atomic with respect to each other.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            feed,
        }
    }

    /// Registers `count` questions for a quiz and returns their ids.
    pub async fn seed_questions(&self, quiz_id: Uuid, count: usize) -> Vec<Uuid> {
        let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
        self.tables
            .write()
            .await
            .quiz_questions
            .entry(quiz_id)
            .or_default()
            .extend(ids.iter().copied());
        ids
    }

    pub async fn xp_history_for_user(&self, user_id: Uuid) -> Vec<XpEntry> {
        self.tables
            .read()
            .await
            .xp_history
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn justification(&self, question_id: Uuid) -> Option<QuestionJustification> {
        self.tables.read().await.justifications.get(&question_id).cloned()
    }

    fn attempt_not_found(attempt_id: Uuid) -> Error {
        Error::NotFound(format!("Quiz attempt {} not found", attempt_id))
    }
}

fn ensure_in_progress(attempt: &QuizAttempt) -> Result<()> {
    if attempt.status != AttemptStatus::InProgress {
        return Err(Error::Conflict("attempt_already_completed".to_string()));
    }
    Ok(())
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<QuizAttempt> {
        let mut tables = self.tables.write().await;
        if tables.attempts.contains_key(&attempt.id) {
            return Err(Error::Conflict(format!("Quiz attempt {} already exists", attempt.id)));
        }
        tables.attempts.insert(attempt.id, attempt.clone());
        self.feed.publish(ChangeEvent::new(
            Table::QuizAttempts,
            ChangeKind::Insert,
            attempt.id,
            attempt,
        ));
        Ok(attempt.clone())
    }

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<QuizAttempt> {
        self.tables
            .read()
            .await
            .attempts
            .get(&attempt_id)
            .cloned()
            .ok_or_else(|| Self::attempt_not_found(attempt_id))
    }

    async fn delete_in_progress(&self, quiz_id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let doomed: Vec<Uuid> = tables
            .attempts
            .values()
            .filter(|a| {
                a.quiz_id == quiz_id && a.user_id == user_id && a.status == AttemptStatus::InProgress
            })
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            if let Some(removed) = tables.attempts.remove(id) {
                self.feed.publish(ChangeEvent::new(
                    Table::QuizAttempts,
                    ChangeKind::Delete,
                    *id,
                    &removed,
                ));
            }
        }
        tables.user_answers.retain(|a| !doomed.contains(&a.attempt_id));
        Ok(doomed.len() as u64)
    }

    async fn record_answer(&self, answer: &NewUserAnswer) -> Result<(QuizAttempt, UserAnswer)> {
        let mut tables = self.tables.write().await;
        let attempt = tables
            .attempts
            .get_mut(&answer.attempt_id)
            .ok_or_else(|| Self::attempt_not_found(answer.attempt_id))?;
        ensure_in_progress(attempt)?;

        let now = Utc::now();
        attempt.answers.insert(answer.question_id, answer.recorded());
        attempt.current_question_index += 1;
        attempt.time_spent = answer.time_taken;
        attempt.updated_at = now;
        let updated = attempt.clone();

        let row = UserAnswer {
            id: Uuid::new_v4(),
            attempt_id: answer.attempt_id,
            question_id: answer.question_id,
            selected_options: answer.selected_options.clone(),
            is_correct: answer.is_correct,
            time_taken: answer.time_taken,
            created_at: now,
        };
        tables.user_answers.push(row.clone());

        self.feed.publish(ChangeEvent::new(
            Table::UserAnswers,
            ChangeKind::Insert,
            row.id,
            &row,
        ));
        self.feed.publish(ChangeEvent::new(
            Table::QuizAttempts,
            ChangeKind::Update,
            answer.attempt_id,
            &updated,
        ));
        Ok((updated, row))
    }

    async fn update_progress(
        &self,
        attempt_id: Uuid,
        time_spent: i32,
        current_question_index: i32,
    ) -> Result<QuizAttempt> {
        let mut tables = self.tables.write().await;
        let attempt = tables
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| Self::attempt_not_found(attempt_id))?;
        ensure_in_progress(attempt)?;
        attempt.time_spent = time_spent;
        attempt.current_question_index = current_question_index;
        attempt.updated_at = Utc::now();
        let updated = attempt.clone();
        self.feed.publish(ChangeEvent::new(
            Table::QuizAttempts,
            ChangeKind::Update,
            attempt_id,
            &updated,
        ));
        Ok(updated)
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        completion: &AttemptCompletion,
    ) -> Result<(QuizAttempt, XpEntry)> {
        let mut tables = self.tables.write().await;
        let ledger_has_attempt = tables
            .xp_history
            .iter()
            .any(|entry| entry.attempt_id == attempt_id);
        let attempt = tables
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| Self::attempt_not_found(attempt_id))?;
        if attempt.status != AttemptStatus::InProgress || ledger_has_attempt {
            return Err(Error::Conflict("attempt_already_completed".to_string()));
        }

        attempt.status = AttemptStatus::Completed;
        attempt.score = Some(completion.score);
        attempt.end_time = Some(completion.end_time);
        attempt.updated_at = completion.end_time;
        let completed = attempt.clone();

        let entry = completion.xp.clone().into_entry(completion.end_time);
        tables.xp_history.push(entry.clone());

        self.feed.publish(ChangeEvent::new(
            Table::QuizAttempts,
            ChangeKind::Update,
            attempt_id,
            &completed,
        ));
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
        let tables = self.tables.read().await;
        let best = tables
            .attempts
            .values()
            .filter(|a| {
                a.quiz_id == quiz_id && a.user_id == user_id && a.status == AttemptStatus::Completed
            })
            .filter_map(|a| a.score.map(|score| (score, a)))
            .max_by(|(left, _), (right, _)| left.total_cmp(right))
            .map(|(_, attempt)| attempt.clone());
        Ok(best)
    }

    async fn list_user_answers(&self, attempt_id: Uuid) -> Result<Vec<UserAnswer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn upsert_justification(
        &self,
        question_id: Uuid,
        justification: &str,
    ) -> Result<QuestionJustification> {
        let row = QuestionJustification {
            question_id,
            justification: justification.to_string(),
            updated_at: Utc::now(),
        };
        let previous = self
            .tables
            .write()
            .await
            .justifications
            .insert(question_id, row.clone());
        let kind = if previous.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.feed.publish(ChangeEvent::new(
            Table::QuestionJustifications,
            kind,
            question_id,
            &row,
        ));
        Ok(row)
    }

    async fn delete_stale_attempts(&self, idle_since: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let stale: Vec<Uuid> = tables
            .attempts
            .values()
            .filter(|a| a.status == AttemptStatus::InProgress && a.updated_at < idle_since)
            .map(|a| a.id)
            .collect();
        for id in &stale {
            if let Some(removed) = tables.attempts.remove(id) {
                self.feed.publish(ChangeEvent::new(
                    Table::QuizAttempts,
                    ChangeKind::Delete,
                    *id,
                    &removed,
                ));
            }
        }
        tables.user_answers.retain(|a| !stale.contains(&a.attempt_id));
        Ok(stale.len() as u64)
    }
}

#[async_trait]
impl QuestionBank for MemoryStore {
    async fn count_for_quiz(&self, quiz_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .quiz_questions
            .get(&quiz_id)
            .map_or(0, |ids| ids.len() as i64))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment> {
        self.tables
            .write()
            .await
            .payments
            .insert(payment.id, payment.clone());
        self.feed.publish(ChangeEvent::new(
            Table::Payments,
            ChangeKind::Insert,
            payment.id,
            payment,
        ));
        Ok(payment.clone())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Payment> {
        self.tables
            .read()
            .await
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Payment {} not found", payment_id)))
    }

    async fn find_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .find(|p| {
                p.merchant_reference == reference
                    || p.gateway_reference.as_deref() == Some(reference)
            })
            .cloned())
    }

    async fn update_payment(&self, payment_id: Uuid, patch: &PaymentPatch) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| Error::NotFound(format!("Payment {} not found", payment_id)))?;
        patch.apply(payment, Utc::now());
        let updated = payment.clone();
        self.feed.publish(ChangeEvent::new(
            Table::Payments,
            ChangeKind::Update,
            payment_id,
            &updated,
        ));
        Ok(updated)
    }
}
