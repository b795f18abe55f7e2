use crate::{MasteryPolicy, WordReviewRecord};
use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewMode {
    /// Records whose next due date has passed (absent due date counts as
    /// due). Falls back to mastery-band staleness when nothing is due.
    Scheduled,
    /// Reviewed records still below the difficult-word threshold, whatever
    /// their schedule says.
    Difficult,
}

/// Pure filter/sort over caller-supplied records. No cursor state; calling
/// again with fresh data restarts from scratch. Hardest words come first,
/// ties broken by longest-unreviewed (never-reviewed ahead of everything).
pub fn select_for_review(
    records: &[WordReviewRecord],
    mode: ReviewMode,
    now: DateTime<Utc>,
    policy: &MasteryPolicy,
) -> Vec<WordReviewRecord> {
    let mut picked = match mode {
        ReviewMode::Scheduled => {
            let due: Vec<WordReviewRecord> =
                records.iter().filter(|r| r.is_due(now)).cloned().collect();
            if due.is_empty() {
                stale_by_band(records, now)
            } else {
                due
            }
        }
        ReviewMode::Difficult => records
            .iter()
            .filter(|r| r.total_reviews > 0 && r.clamped_mastery() < policy.difficult_threshold)
            .cloned()
            .collect(),
    };

    picked.sort_by(|a, b| {
        a.clamped_mastery()
            .cmp(&b.clamped_mastery())
            .then_with(|| a.last_reviewed_at.cmp(&b.last_reviewed_at))
    });
    picked
}

/// Secondary heuristic for stores whose records predate the scheduler:
/// a record is stale once its band's interval has elapsed since the last
/// review.
fn stale_by_band(records: &[WordReviewRecord], now: DateTime<Utc>) -> Vec<WordReviewRecord> {
    records
        .iter()
        .filter(|r| match r.last_reviewed_at {
            Some(last) => now - last >= Duration::days(r.mastery_band().stale_after_days()),
            None => false,
        })
        .cloned()
        .collect()
}
