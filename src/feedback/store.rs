//! Feedback log: in-memory, append-only record of processed feedback.
//!
//! Best effort: nothing survives a restart.

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::model::FeedbackRecord;

#[derive(Default)]
pub struct FeedbackStore {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return a copy of it.
    pub async fn save(&self, record: FeedbackRecord) -> FeedbackRecord {
        info!(feedback_id = %record.id, from = %record.from, "Feedback saved");
        self.records.write().await.push(record.clone());
        record
    }

    pub async fn get(&self, id: Uuid) -> Option<FeedbackRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// All records, oldest first.
    pub async fn all(&self) -> Vec<FeedbackRecord> {
        self.records.read().await.clone()
    }
}
