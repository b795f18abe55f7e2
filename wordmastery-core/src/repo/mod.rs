use crate::{CoreError, ReviewApplied, ReviewEvent, ReviewOutcome, WordReviewRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;

/// Storage seam for review records, keyed by (user, word). Implementations
/// must make `record_review` an atomic read-modify-write per key; two
/// concurrent reviews of the same word must both land.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_record(&self, user_id: &str, word_id: &str)
        -> Result<WordReviewRecord, CoreError>;

    async fn list_records(&self, user_id: &str) -> Result<Vec<WordReviewRecord>, CoreError>;

    /// Loads the record (or starts a fresh one), applies the outcome,
    /// stamps the next due date, stores the result, and appends the review
    /// event.
    async fn record_review(
        &self,
        user_id: &str,
        word_id: &str,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ReviewApplied, CoreError>;

    /// Installs a fresh record for the word, discarding its mastery state.
    /// The event log is append-only history and is kept.
    async fn reset_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<WordReviewRecord, CoreError>;

    async fn list_events(&self, user_id: &str, word_id: &str)
        -> Result<Vec<ReviewEvent>, CoreError>;
}

pub fn validate_ids(user_id: &str, word_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::Invalid("user id is empty"));
    }
    if word_id.trim().is_empty() {
        return Err(CoreError::Invalid("word id is empty"));
    }
    Ok(())
}
