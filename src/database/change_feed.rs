use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    QuizAttempts,
    UserAnswers,
    XpHistory,
    QuestionJustifications,
    Payments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: Uuid,
    pub record: JsonValue,
}

impl ChangeEvent {
    pub fn new<T: Serialize>(table: Table, kind: ChangeKind, record_id: Uuid, record: &T) -> Self {
        Self {
            table,
            kind,
            record_id,
            record: serde_json::to_value(record).unwrap_or(JsonValue::Null),
        }
    }
}

/// In-process realtime notifications of row changes made through the stores.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is the common case.
        let _ = self.tx.send(event);
    }

    /// Subscribes to changes on `table`, optionally narrowed to a single row.
    pub fn subscribe(&self, table: Table, record_id: Option<Uuid>) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            table,
            record_id,
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    table: Table,
    record_id: Option<Uuid>,
}

impl Subscription {
    fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && self.record_id.map_or(true, |id| id == event.record_id)
    }

    /// Next matching event, or `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, table = ?self.table, "change subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
