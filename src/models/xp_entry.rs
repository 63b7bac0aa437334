use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const QUIZ_SOURCE: &str = "quiz";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct XpEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub xp_gained: i32,
    pub source_type: String,
    pub source_id: Uuid,
    pub quiz_id: Uuid,
    pub attempt_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewXpEntry {
    pub user_id: Uuid,
    pub xp_gained: i32,
    pub quiz_id: Uuid,
    pub attempt_id: Uuid,
}

impl NewXpEntry {
    pub fn into_entry(self, created_at: DateTime<Utc>) -> XpEntry {
        XpEntry {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            xp_gained: self.xp_gained,
            source_type: QUIZ_SOURCE.to_string(),
            source_id: self.quiz_id,
            quiz_id: self.quiz_id,
            attempt_id: self.attempt_id,
            created_at,
        }
    }
}
