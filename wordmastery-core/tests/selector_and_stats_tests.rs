use chrono::{DateTime, Duration, TimeZone, Utc};
use wordmastery_core::{
    mastery_distribution, select_for_review, summarize, ActivityType, MasteryBand, MasteryPolicy,
    ReviewEvent, ReviewMode, ReviewOutcome, WordReviewRecord,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 18, 30, 0).unwrap()
}

fn reviewed(word: &str, mastery: u8, total: u32) -> WordReviewRecord {
    let mut r = WordReviewRecord::new(word);
    r.mastery_level = mastery;
    r.total_reviews = total;
    r.correct_count = total;
    r
}

#[test]
fn difficult_mode_picks_weak_words_hardest_first() {
    let policy = MasteryPolicy::default();
    let records = vec![
        reviewed("ostensible", 30, 2),
        reviewed("ubiquitous", 80, 5),
        reviewed("ephemeral", 10, 1),
    ];

    let picked = select_for_review(&records, ReviewMode::Difficult, t0(), &policy);
    let words: Vec<&str> = picked.iter().map(|r| r.word_id.as_str()).collect();
    assert_eq!(words, ["ephemeral", "ostensible"]);
}

#[test]
fn difficult_mode_ignores_never_reviewed_words() {
    let policy = MasteryPolicy::default();
    let records = vec![WordReviewRecord::new("untouched"), reviewed("seen", 20, 1)];

    let picked = select_for_review(&records, ReviewMode::Difficult, t0(), &policy);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].word_id, "seen");
}

#[test]
fn difficult_threshold_comes_from_policy() {
    let policy = MasteryPolicy {
        difficult_threshold: 70,
        ..MasteryPolicy::default()
    };
    let records = vec![reviewed("borderline", 60, 3)];
    let picked = select_for_review(&records, ReviewMode::Difficult, t0(), &policy);
    assert_eq!(picked.len(), 1);
}

#[test]
fn scheduled_mode_returns_only_due_records() {
    let policy = MasteryPolicy::default();
    let now = t0();

    let mut due = reviewed("laconic", 50, 3);
    due.last_reviewed_at = Some(now - Duration::days(4));
    due.next_review_at = Some(now - Duration::days(1));

    let mut not_due = reviewed("garrulous", 60, 4);
    not_due.last_reviewed_at = Some(now - Duration::hours(2));
    not_due.next_review_at = Some(now + Duration::days(5));

    let picked = select_for_review(&[due, not_due], ReviewMode::Scheduled, now, &policy);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].word_id, "laconic");
}

#[test]
fn missing_next_review_counts_as_due() {
    let policy = MasteryPolicy::default();
    let now = t0();

    // Record shape written before the scheduler existed: no due date.
    let legacy: WordReviewRecord = serde_json::from_str(
        r#"{
            "word_id": "antediluvian",
            "mastery_level": 35,
            "total_reviews": 6,
            "correct_count": 4,
            "incorrect_count": 2,
            "streak_count": 1
        }"#,
    )
    .expect("legacy record parses");
    assert_eq!(legacy.next_review_at, None);

    let mut scheduled_out = reviewed("current", 70, 3);
    scheduled_out.last_reviewed_at = Some(now - Duration::hours(1));
    scheduled_out.next_review_at = Some(now + Duration::days(3));

    let picked = select_for_review(&[legacy, scheduled_out], ReviewMode::Scheduled, now, &policy);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].word_id, "antediluvian");
}

#[test]
fn scheduled_mode_falls_back_to_stale_bands_when_nothing_is_due() {
    let policy = MasteryPolicy::default();
    let now = t0();

    // All records have future due dates, so the primary pass is empty.
    let mut shaky = reviewed("laconic", 45, 4);
    shaky.last_reviewed_at = Some(now - Duration::days(3));
    shaky.next_review_at = Some(now + Duration::days(10));

    let mut strong = reviewed("ubiquitous", 85, 9);
    strong.last_reviewed_at = Some(now - Duration::days(3));
    strong.next_review_at = Some(now + Duration::days(10));

    let picked = select_for_review(&[shaky, strong], ReviewMode::Scheduled, now, &policy);
    // Band >=40 goes stale after 2 days; band >=80 only after 7.
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].word_id, "laconic");
}

#[test]
fn ties_break_toward_longest_unreviewed() {
    let policy = MasteryPolicy::default();
    let now = t0();

    let mut older = reviewed("first", 30, 2);
    older.last_reviewed_at = Some(now - Duration::days(10));
    let mut newer = reviewed("second", 30, 2);
    newer.last_reviewed_at = Some(now - Duration::days(1));
    let never = {
        let mut r = reviewed("third", 30, 2);
        r.last_reviewed_at = None;
        r
    };

    let picked = select_for_review(
        &[newer, older, never],
        ReviewMode::Difficult,
        now,
        &policy,
    );
    let words: Vec<&str> = picked.iter().map(|r| r.word_id.as_str()).collect();
    assert_eq!(words, ["third", "first", "second"]);
}

#[test]
fn corrupt_mastery_sorts_as_if_clamped() {
    let policy = MasteryPolicy::default();
    let now = t0();

    let mut corrupt = reviewed("overflowed", 200, 3);
    corrupt.next_review_at = Some(now - Duration::hours(1));
    let mut sane = reviewed("plain", 90, 3);
    sane.next_review_at = Some(now - Duration::hours(1));

    let picked = select_for_review(&[corrupt, sane], ReviewMode::Scheduled, now, &policy);
    let words: Vec<&str> = picked.iter().map(|r| r.word_id.as_str()).collect();
    // 200 normalizes to 100, so the 90 record is harder and comes first.
    assert_eq!(words, ["plain", "overflowed"]);
}

#[test]
fn selection_is_restartable() {
    let policy = MasteryPolicy::default();
    let now = t0();
    let mut rec = reviewed("stable", 20, 2);
    rec.next_review_at = Some(now - Duration::days(1));
    let records = vec![rec];

    let a = select_for_review(&records, ReviewMode::Scheduled, now, &policy);
    let b = select_for_review(&records, ReviewMode::Scheduled, now, &policy);
    assert_eq!(a, b);
}

#[test]
fn summarize_breaks_down_by_day_and_activity() {
    let now = t0();
    let quiz = ReviewOutcome::new(true).with_activity(ActivityType::Quiz);
    let flash_miss = ReviewOutcome::new(false).with_activity(ActivityType::Flashcard);
    let untagged = ReviewOutcome::new(true);

    let events = vec![
        ReviewEvent::new("a", &quiz, now - Duration::days(1), 1, 10),
        ReviewEvent::new("b", &flash_miss, now, 1, 5),
        ReviewEvent::new("c", &untagged, now, 3, 30),
    ];

    let s = summarize(&events);
    assert_eq!(s.totals.total, 3);
    assert_eq!(s.totals.correct, 2);
    assert_eq!(s.totals.incorrect, 1);
    assert!((s.totals.accuracy() - 2.0 / 3.0).abs() < f32::EPSILON);

    assert_eq!(s.per_day.len(), 2);
    assert_eq!(s.per_day[&now.date_naive()].total, 2);

    // Untagged events carry no activity and stay out of the breakdown.
    assert_eq!(s.per_activity.len(), 2);
    assert_eq!(s.per_activity[&ActivityType::Quiz].correct, 1);
    assert_eq!(s.per_activity[&ActivityType::Flashcard].incorrect, 1);
}

#[test]
fn mastery_distribution_buckets_by_band() {
    let records = vec![
        reviewed("a", 5, 1),
        reviewed("b", 45, 1),
        reviewed("c", 65, 1),
        reviewed("d", 95, 1),
        reviewed("e", 82, 1),
    ];

    let dist = mastery_distribution(&records);
    assert_eq!(dist[&MasteryBand::Struggling], 1);
    assert_eq!(dist[&MasteryBand::Learning], 1);
    assert_eq!(dist[&MasteryBand::Familiar], 1);
    assert_eq!(dist[&MasteryBand::Mastered], 2);
}
