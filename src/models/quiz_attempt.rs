use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "completed" => Ok(AttemptStatus::Completed),
            other => Err(format!("unknown attempt status '{}'", other)),
        }
    }
}

/// Answer recorded for one question inside an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedAnswer {
    pub selected_options: Vec<String>,
    pub is_correct: bool,
    pub time_spent: i32,
}

/// Question id -> latest answer. Last write wins per question.
pub type AnswerMap = BTreeMap<Uuid, RecordedAnswer>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub status: AttemptStatus,
    pub current_question_index: i32,
    /// Cumulative seconds, overwritten by each checkpoint.
    pub time_spent: i32,
    pub answers: AnswerMap,
    pub score: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(quiz_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz_id,
            user_id,
            status: AttemptStatus::InProgress,
            current_question_index: 0,
            time_spent: 0,
            answers: AnswerMap::new(),
            score: None,
            start_time: now,
            end_time: None,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStatusSnapshot {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub answered_questions: i64,
    /// Size of the quiz's question bank, not the answered count.
    pub total_questions: i64,
    pub progress_percent: f64,
    pub time_spent: i32,
    pub current_question_index: i32,
    pub score: Option<f64>,
}
