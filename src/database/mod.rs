pub mod change_feed;
pub mod memory_store;
pub mod pg_store;
pub mod pool;
pub mod store;

use std::sync::Arc;

use change_feed::ChangeFeed;
use memory_store::MemoryStore;
use pg_store::PgStore;
use sqlx::PgPool;
use store::{PaymentStore, QuestionBank, QuizStore};

/// The persistence collaborators handed to the services, sharing one change feed.
#[derive(Clone)]
pub struct Stores {
    pub quiz: Arc<dyn QuizStore>,
    pub questions: Arc<dyn QuestionBank>,
    pub payments: Arc<dyn PaymentStore>,
    pub feed: ChangeFeed,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let feed = ChangeFeed::default();
        let store = Arc::new(PgStore::new(pool, feed.clone()));
        Self {
            quiz: store.clone(),
            questions: store.clone(),
            payments: store,
            feed,
        }
    }

    pub fn memory() -> (Self, Arc<MemoryStore>) {
        let feed = ChangeFeed::default();
        let store = Arc::new(MemoryStore::new(feed.clone()));
        let stores = Self {
            quiz: store.clone(),
            questions: store.clone(),
            payments: store.clone(),
            feed,
        };
        (stores, store)
    }
}
