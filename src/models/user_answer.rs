use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::quiz_attempt::RecordedAnswer;

/// Append-only audit row, one per saved answer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_options: Vec<String>,
    pub is_correct: bool,
    pub time_taken: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserAnswer {
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_options: Vec<String>,
    pub is_correct: bool,
    pub time_taken: i32,
}

impl NewUserAnswer {
    /// The entry stored in the attempt's answer map for this submission.
    pub fn recorded(&self) -> RecordedAnswer {
        RecordedAnswer {
            selected_options: self.selected_options.clone(),
            is_correct: self.is_correct,
            time_spent: self.time_taken,
        }
    }
}
