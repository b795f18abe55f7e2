use crate::{ActivityType, MasteryBand, ReviewEvent, WordReviewRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Totals {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl Totals {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsSummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
    pub per_activity: BTreeMap<ActivityType, Totals>,
}

pub fn summarize(events: &[ReviewEvent]) -> StatsSummary {
    let mut summary = StatsSummary::default();
    for e in events {
        summary.totals.record(e.correct);
        let d = e.reviewed_at.date_naive();
        summary.per_day.entry(d).or_default().record(e.correct);
        if let Some(activity) = e.activity {
            summary
                .per_activity
                .entry(activity)
                .or_default()
                .record(e.correct);
        }
    }
    summary
}

pub fn mastery_distribution(records: &[WordReviewRecord]) -> BTreeMap<MasteryBand, u32> {
    let mut map = BTreeMap::new();
    for r in records {
        *map.entry(r.mastery_band()).or_insert(0) += 1;
    }
    map
}
