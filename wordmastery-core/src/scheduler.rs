use crate::WordReviewRecord;
use chrono::{DateTime, Duration, Utc};

/// Review interval in days, indexed by consecutive-correct streak. An
/// incorrect answer resets the streak to 0, so it always lands back on the
/// one-day entry. Non-decreasing.
pub const INTERVAL_TABLE: [i64; 7] = [1, 1, 3, 7, 14, 30, 60];

/// Interval for a streak. Streaks past the table's end keep doubling the
/// last entry (120, 240, ...); the shift is bounded so the resulting date
/// stays inside `chrono`'s representable range.
pub fn interval_days(streak_count: u32) -> i64 {
    let idx = streak_count as usize;
    if let Some(days) = INTERVAL_TABLE.get(idx) {
        return *days;
    }
    let doublings = (idx - (INTERVAL_TABLE.len() - 1)).min(20) as u32;
    INTERVAL_TABLE[INTERVAL_TABLE.len() - 1].saturating_mul(1i64 << doublings)
}

/// Next due timestamp for an updated record: the last review time plus the
/// streak-keyed interval. A record that has never been reviewed is anchored
/// at `now`.
pub fn compute_next_due(record: &WordReviewRecord, now: DateTime<Utc>) -> DateTime<Utc> {
    let reviewed_at = record.last_reviewed_at.unwrap_or(now);
    reviewed_at + Duration::days(interval_days(record.streak_count))
}
