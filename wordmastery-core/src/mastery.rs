use crate::{
    scheduler, MasteryPolicy, ReviewEvent, ReviewOutcome, WordReviewRecord, MASTERY_MAX,
    MASTERY_MIN,
};
use chrono::{DateTime, Utc};

/// Result of applying one review: the updated record plus the log entry to
/// append.
#[derive(Clone, Debug)]
pub struct ReviewApplied {
    pub record: WordReviewRecord,
    pub event: ReviewEvent,
}

fn clamp_mastery(x: i32) -> u8 {
    x.clamp(i32::from(MASTERY_MIN), i32::from(MASTERY_MAX)) as u8
}

/// Applies one review outcome to a record. Pure and total: `None` means
/// first review (a fresh record is created for `word_id`), out-of-range
/// stored mastery is normalized before the delta, and nothing here touches
/// `next_review_at` (the scheduler owns that field).
pub fn apply_review(
    record: Option<WordReviewRecord>,
    word_id: &str,
    outcome: &ReviewOutcome,
    now: DateTime<Utc>,
    policy: &MasteryPolicy,
) -> WordReviewRecord {
    let mut rec = record.unwrap_or_else(|| WordReviewRecord::new(word_id));
    let before = i32::from(rec.clamped_mastery());

    if outcome.correct {
        rec.mastery_level = clamp_mastery(before + policy.correct_delta);
        rec.streak_count += 1;
        rec.correct_count += 1;
    } else {
        rec.mastery_level = clamp_mastery(before - policy.incorrect_delta);
        rec.streak_count = 0;
        rec.incorrect_count += 1;
    }

    rec.total_reviews += 1;
    if rec.first_reviewed_at.is_none() {
        rec.first_reviewed_at = Some(now);
    }
    rec.last_reviewed_at = Some(now);
    rec
}

/// Applies the outcome, stamps the next due date, and emits the review
/// event. The composed form stores use for their read-modify-write.
pub fn apply_and_schedule(
    record: Option<WordReviewRecord>,
    word_id: &str,
    outcome: &ReviewOutcome,
    now: DateTime<Utc>,
    policy: &MasteryPolicy,
) -> ReviewApplied {
    let mut rec = apply_review(record, word_id, outcome, now, policy);
    rec.next_review_at = Some(scheduler::compute_next_due(&rec, now));

    let event = ReviewEvent::new(
        rec.word_id.clone(),
        outcome,
        now,
        scheduler::interval_days(rec.streak_count),
        rec.mastery_level,
    );

    ReviewApplied { record: rec, event }
}
