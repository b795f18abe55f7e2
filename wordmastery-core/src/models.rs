use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WordId = String;
pub type UserId = String;
pub type EventId = Uuid;

pub const MASTERY_MIN: u8 = 0;
pub const MASTERY_MAX: u8 = 100;
pub const CORRECT_DELTA: i32 = 10;
pub const INCORRECT_DELTA: i32 = 5;
pub const DIFFICULT_THRESHOLD: u8 = 50;

/// Study activity that produced a review. Analytics only; the scheduling
/// math never looks at it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Flashcard,
    Quiz,
    Typing,
    Review,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub correct: bool,
    pub activity: Option<ActivityType>,
}

impl ReviewOutcome {
    pub fn new(correct: bool) -> Self {
        Self {
            correct,
            activity: None,
        }
    }

    pub fn with_activity(mut self, activity: ActivityType) -> Self {
        self.activity = Some(activity);
        self
    }
}

/// Tunable policy constants for the mastery updater and selector. Defaults
/// are the canonical +10/-5 deltas and the 50% difficult-word threshold.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasteryPolicy {
    pub correct_delta: i32,
    pub incorrect_delta: i32,
    pub difficult_threshold: u8,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            correct_delta: CORRECT_DELTA,
            incorrect_delta: INCORRECT_DELTA,
            difficult_threshold: DIFFICULT_THRESHOLD,
        }
    }
}

/// Retention confidence band for a record, used for the scheduled-mode
/// staleness fallback and for distribution summaries.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MasteryBand {
    Struggling,
    Learning,
    Familiar,
    Mastered,
}

impl MasteryBand {
    pub fn of(mastery_level: u8) -> Self {
        if mastery_level >= 80 {
            MasteryBand::Mastered
        } else if mastery_level >= 60 {
            MasteryBand::Familiar
        } else if mastery_level >= 40 {
            MasteryBand::Learning
        } else {
            MasteryBand::Struggling
        }
    }

    /// Days without review after which a record in this band counts as
    /// stale when nothing is scheduled-due.
    pub fn stale_after_days(self) -> i64 {
        match self {
            MasteryBand::Mastered => 7,
            MasteryBand::Familiar => 3,
            MasteryBand::Learning => 2,
            MasteryBand::Struggling => 1,
        }
    }
}

/// Per-(user, word) review state. Mutated only through
/// `mastery::apply_review`; `scheduler::compute_next_due` is the only
/// source of `next_review_at`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordReviewRecord {
    pub word_id: WordId,
    pub mastery_level: u8,
    pub total_reviews: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub streak_count: u32,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_reviewed_at: Option<DateTime<Utc>>,
}

impl WordReviewRecord {
    pub fn new(word_id: impl Into<WordId>) -> Self {
        Self {
            word_id: word_id.into(),
            mastery_level: MASTERY_MIN,
            total_reviews: 0,
            correct_count: 0,
            incorrect_count: 0,
            streak_count: 0,
            last_reviewed_at: None,
            next_review_at: None,
            first_reviewed_at: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.total_reviews == 0
    }

    /// Mastery normalized into [0,100]. Stored values above the range can
    /// occur in records written by older pipelines; they are clamped on
    /// read, never rejected.
    pub fn clamped_mastery(&self) -> u8 {
        self.mastery_level.min(MASTERY_MAX)
    }

    pub fn mastery_band(&self) -> MasteryBand {
        MasteryBand::of(self.clamped_mastery())
    }

    /// A record with no `next_review_at` (never reviewed, or imported
    /// before scheduling existed) is due immediately.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            Some(due) => due <= now,
            None => true,
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.total_reviews == 0 {
            0.0
        } else {
            self.correct_count as f32 / self.total_reviews as f32
        }
    }
}

/// Append-only log entry emitted for every applied review.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewEvent {
    pub id: EventId,
    pub word_id: WordId,
    pub correct: bool,
    pub activity: Option<ActivityType>,
    pub reviewed_at: DateTime<Utc>,
    pub interval_applied: i64,
    pub mastery_after: u8,
}

impl ReviewEvent {
    pub fn new(
        word_id: impl Into<WordId>,
        outcome: &ReviewOutcome,
        reviewed_at: DateTime<Utc>,
        interval_applied: i64,
        mastery_after: u8,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            word_id: word_id.into(),
            correct: outcome.correct,
            activity: outcome.activity,
            reviewed_at,
            interval_applied,
            mastery_after,
        }
    }
}
