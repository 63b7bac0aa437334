use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResults {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub score: f64,
    pub xp_gained: i32,
    pub status: PassStatus,
    pub completed_at: DateTime<Utc>,
}
