use crate::repo::validate_ids;
use crate::{
    mastery, CoreError, MasteryPolicy, ReviewApplied, ReviewEvent, ReviewOutcome, UserId, WordId,
    WordReviewRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

type Key = (UserId, WordId);

#[derive(Default)]
pub struct MemoryRepo {
    policy: MasteryPolicy,
    records: RwLock<HashMap<Key, WordReviewRecord>>,
    events: RwLock<HashMap<Key, Vec<ReviewEvent>>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MasteryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

fn key(user_id: &str, word_id: &str) -> Key {
    (user_id.to_string(), word_id.to_string())
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn get_record(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<WordReviewRecord, CoreError> {
        self.records
            .read()
            .get(&key(user_id, word_id))
            .cloned()
            .ok_or(CoreError::NotFound("record"))
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<WordReviewRecord>, CoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn record_review(
        &self,
        user_id: &str,
        word_id: &str,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ReviewApplied, CoreError> {
        validate_ids(user_id, word_id)?;
        let k = key(user_id, word_id);

        // Write lock held across the read-modify-write: concurrent reviews
        // of the same word serialize here instead of losing an update.
        let mut records = self.records.write();
        let current = records.get(&k).cloned();
        let applied = mastery::apply_and_schedule(current, word_id, outcome, now, &self.policy);
        records.insert(k.clone(), applied.record.clone());
        self.events.write().entry(k).or_default().push(applied.event.clone());
        Ok(applied)
    }

    async fn reset_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<WordReviewRecord, CoreError> {
        validate_ids(user_id, word_id)?;
        let fresh = WordReviewRecord::new(word_id);
        self.records
            .write()
            .insert(key(user_id, word_id), fresh.clone());
        Ok(fresh)
    }

    async fn list_events(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Vec<ReviewEvent>, CoreError> {
        Ok(self
            .events
            .read()
            .get(&key(user_id, word_id))
            .cloned()
            .unwrap_or_default())
    }
}
