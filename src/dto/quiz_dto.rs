use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::quiz_attempt::QuizAttempt;
use crate::models::quiz_results::QuizResults;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(max = 64))]
    pub selected_options: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub correct_options: Vec<String>,
    #[validate(range(min = 0))]
    pub time_spent: i32,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAnswerResponse {
    pub saved: bool,
    pub question_id: Uuid,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0))]
    pub time_spent: i32,
    #[validate(range(min = 0))]
    pub current_question_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishQuizResponse {
    pub attempt_id: Uuid,
    #[serde(flatten)]
    pub results: QuizResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestAttemptResponse {
    pub attempt: Option<QuizAttempt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveJustificationRequest {
    #[validate(length(min = 1, max = 5000))]
    pub justification: String,
}
