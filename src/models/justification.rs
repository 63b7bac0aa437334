use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionJustification {
    pub question_id: Uuid,
    pub justification: String,
    pub updated_at: DateTime<Utc>,
}
