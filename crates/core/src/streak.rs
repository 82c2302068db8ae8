use chrono::{DateTime, Utc};

use crate::model::UserProgress;
use crate::time::DayBoundary;

/// Ten minutes of speaking per day.
pub const SPEAKING_GOAL_SECONDS: u32 = 10 * 60;
/// New words saved per day.
pub const VOCAB_GOAL_WORDS: u32 = 5;
/// A scored completion adds `amount / SCORE_TO_SECONDS_DIVISOR` speaking seconds.
pub const SCORE_TO_SECONDS_DIVISOR: u32 = 10;

//
// ─── DAILY GOALS ───────────────────────────────────────────────────────────────
//

/// Thresholds a learner must reach within one calendar day to keep the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyGoals {
    speaking_seconds: u32,
    vocab_words: u32,
}

impl DailyGoals {
    #[must_use]
    pub fn new(speaking_seconds: u32, vocab_words: u32) -> Self {
        Self {
            speaking_seconds,
            vocab_words,
        }
    }

    #[must_use]
    pub fn speaking_seconds(&self) -> u32 {
        self.speaking_seconds
    }

    #[must_use]
    pub fn vocab_words(&self) -> u32 {
        self.vocab_words
    }

    #[must_use]
    pub fn speaking_met(&self, progress: &UserProgress) -> bool {
        progress.daily_speaking_seconds >= self.speaking_seconds
    }

    #[must_use]
    pub fn vocab_met(&self, progress: &UserProgress) -> bool {
        progress.daily_vocab_learned >= self.vocab_words
    }

    #[must_use]
    pub fn all_met(&self, progress: &UserProgress) -> bool {
        self.speaking_met(progress) && self.vocab_met(progress)
    }
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self::new(SPEAKING_GOAL_SECONDS, VOCAB_GOAL_WORDS)
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// A finished practice activity, as fed to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeCompletion {
    /// One new vocabulary word was saved.
    Vocabulary,
    /// A scored exercise finished.
    ///
    /// `amount` is treated as proportional to speaking time: it contributes
    /// `amount / 10` seconds. For speaking sessions the amount is the
    /// pronunciation score, so this conflates quality with duration. The
    /// 600-second goal is calibrated against exactly this formula, so it is
    /// kept as is.
    Scored { amount: u32 },
}

impl PracticeCompletion {
    #[must_use]
    pub fn new(amount: u32, is_vocabulary: bool) -> Self {
        if is_vocabulary {
            Self::Vocabulary
        } else {
            Self::Scored { amount }
        }
    }

    #[must_use]
    pub fn is_vocabulary(self) -> bool {
        matches!(self, Self::Vocabulary)
    }
}

/// How a completion moved the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Same-day event; the streak is untouched.
    Unchanged,
    /// Yesterday ended with both goals met.
    Continued { from: u32, to: u32 },
    /// A gap, or yesterday's goals were missed.
    Restarted { from: u32 },
}

/// Updated record plus what happened on the way there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub progress: UserProgress,
    pub new_day: bool,
    pub streak: StreakChange,
    /// True only for the event that flipped `daily_streak_awarded` to true.
    pub goals_reached: bool,
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Pure daily-progress and streak bookkeeping.
///
/// Every operation takes a snapshot and returns the next one; nothing here
/// performs I/O or can fail. Callers own persistence and must apply events for
/// one learner one at a time.
///
/// # Examples
///
/// ```
/// # use speakwell_core::model::UserProgress;
/// # use speakwell_core::streak::{PracticeCompletion, StreakTracker};
/// # use speakwell_core::time::fixed_now;
/// let tracker = StreakTracker::default();
/// let fresh = UserProgress::new();
/// let outcome =
///     tracker.record_practice_completion(&fresh, fixed_now(), PracticeCompletion::Vocabulary);
/// assert_eq!(outcome.progress.current_streak(), 1);
/// assert_eq!(outcome.progress.daily_vocab_learned(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakTracker {
    goals: DailyGoals,
    boundary: DayBoundary,
}

impl StreakTracker {
    #[must_use]
    pub fn new(goals: DailyGoals, boundary: DayBoundary) -> Self {
        Self { goals, boundary }
    }

    #[must_use]
    pub fn goals(&self) -> DailyGoals {
        self.goals
    }

    #[must_use]
    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    /// Apply one practice completion at `now`.
    #[must_use]
    pub fn record_practice_completion(
        &self,
        record: &UserProgress,
        now: DateTime<Utc>,
        completion: PracticeCompletion,
    ) -> CompletionOutcome {
        let previous = record;
        let new_day = !self.boundary.same_day(previous.last_practice_at, now);

        let mut next = previous.clone();
        if new_day {
            next.daily_speaking_seconds = 0;
            next.daily_vocab_learned = 0;
            next.daily_streak_awarded = false;
            next.daily_sessions_completed = 1;
        } else {
            next.daily_sessions_completed = next.daily_sessions_completed.saturating_add(1);
        }

        next.practice_sessions_completed = next.practice_sessions_completed.saturating_add(1);
        next.last_practice_at = now;

        match completion {
            PracticeCompletion::Vocabulary => {
                next.daily_vocab_learned = next.daily_vocab_learned.saturating_add(1);
                next.words_learned = next.words_learned.saturating_add(1);
            }
            PracticeCompletion::Scored { amount } if amount > 0 => {
                next.daily_speaking_seconds = next
                    .daily_speaking_seconds
                    .saturating_add(amount / SCORE_TO_SECONDS_DIVISOR);
            }
            PracticeCompletion::Scored { .. } => {}
        }

        // Checked after the day reset, so a new day's first event can award it.
        let goals_reached = !next.daily_streak_awarded && self.goals.all_met(&next);
        if goals_reached {
            next.daily_streak_awarded = true;
        }

        let streak = if new_day {
            // Judged on the record as it stood before the reset above.
            let yesterday_met = previous.daily_streak_awarded
                && self.boundary.is_day_before(previous.last_practice_at, now);
            if yesterday_met {
                next.current_streak = previous.current_streak.saturating_add(1);
                StreakChange::Continued {
                    from: previous.current_streak,
                    to: next.current_streak,
                }
            } else {
                next.current_streak = 1;
                StreakChange::Restarted {
                    from: previous.current_streak,
                }
            }
        } else {
            StreakChange::Unchanged
        };

        CompletionOutcome {
            progress: next,
            new_day,
            streak,
            goals_reached,
        }
    }

    /// True when the daily challenge has not been dismissed yet today.
    #[must_use]
    pub fn daily_challenge_due(&self, record: &UserProgress, now: DateTime<Utc>) -> bool {
        !self.boundary.same_day(record.last_daily_challenge_at, now)
    }
}

/// [`StreakTracker::record_practice_completion`] with the default goals and a
/// UTC day boundary, returning only the updated record.
#[must_use]
pub fn record_practice_completion(
    record: &UserProgress,
    now: DateTime<Utc>,
    completion: PracticeCompletion,
) -> UserProgress {
    StreakTracker::default()
        .record_practice_completion(record, now, completion)
        .progress
}

/// Clear a pending milestone celebration. Idempotent.
#[must_use]
pub fn acknowledge_milestone(record: &UserProgress) -> UserProgress {
    let mut next = record.clone();
    next.milestone_achieved = 0;
    next
}

/// Remember that the daily challenge was dismissed at `now`.
#[must_use]
pub fn close_daily_challenge(record: &UserProgress, now: DateTime<Utc>) -> UserProgress {
    let mut next = record.clone();
    next.last_daily_challenge_at = now;
    next
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserProgressDraft;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn yesterday() -> DateTime<Utc> {
        fixed_now() - Duration::days(1)
    }

    fn record(draft: UserProgressDraft) -> UserProgress {
        draft.normalize()
    }

    fn met_yesterday(streak: u32, awarded: bool) -> UserProgress {
        record(UserProgressDraft {
            last_practice_at: Some(yesterday()),
            daily_speaking_seconds: Some(900),
            daily_vocab_learned: Some(8),
            daily_streak_awarded: Some(awarded),
            daily_sessions_completed: Some(6),
            current_streak: Some(streak),
            practice_sessions_completed: Some(40),
            ..UserProgressDraft::default()
        })
    }

    fn assert_award_invariant(progress: &UserProgress) {
        if progress.daily_streak_awarded() {
            assert!(progress.daily_speaking_seconds() >= SPEAKING_GOAL_SECONDS);
            assert!(progress.daily_vocab_learned() >= VOCAB_GOAL_WORDS);
        }
    }

    #[test]
    fn new_day_resets_counters_and_continues_streak() {
        let before = met_yesterday(4, true);
        let outcome = StreakTracker::default().record_practice_completion(
            &before,
            fixed_now(),
            PracticeCompletion::new(0, false),
        );
        let after = &outcome.progress;

        assert!(outcome.new_day);
        assert_eq!(after.daily_speaking_seconds(), 0);
        assert_eq!(after.daily_vocab_learned(), 0);
        assert!(!after.daily_streak_awarded());
        assert_eq!(after.daily_sessions_completed(), 1);
        assert_eq!(after.current_streak(), 5);
        assert_eq!(outcome.streak, StreakChange::Continued { from: 4, to: 5 });
        assert_eq!(after.practice_sessions_completed(), 41);
        assert_eq!(after.last_practice_at(), fixed_now());
    }

    #[test]
    fn missed_goals_yesterday_restart_streak() {
        let before = met_yesterday(4, false);
        let after =
            record_practice_completion(&before, fixed_now(), PracticeCompletion::new(0, false));
        assert_eq!(after.current_streak(), 1);
    }

    #[test]
    fn gap_of_more_than_one_day_restarts_streak() {
        let mut before = met_yesterday(9, true);
        before.last_practice_at = fixed_now() - Duration::days(3);
        let outcome = StreakTracker::default().record_practice_completion(
            &before,
            fixed_now(),
            PracticeCompletion::Vocabulary,
        );
        assert_eq!(outcome.progress.current_streak(), 1);
        assert_eq!(outcome.streak, StreakChange::Restarted { from: 9 });
    }

    #[test]
    fn first_event_on_fresh_record_starts_streak_at_one() {
        let after = record_practice_completion(
            &UserProgress::new(),
            fixed_now(),
            PracticeCompletion::Scored { amount: 80 },
        );
        assert_eq!(after.current_streak(), 1);
        assert_eq!(after.daily_speaking_seconds(), 8);
        assert_eq!(after.daily_sessions_completed(), 1);
    }

    #[test]
    fn crossing_both_goals_mid_day_awards_once() {
        let before = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(1)),
            daily_speaking_seconds: Some(550),
            daily_vocab_learned: Some(5),
            daily_streak_awarded: Some(false),
            current_streak: Some(2),
            ..UserProgressDraft::default()
        });
        let tracker = StreakTracker::default();

        let first = tracker.record_practice_completion(
            &before,
            fixed_now(),
            PracticeCompletion::new(500, false),
        );
        assert_eq!(first.progress.daily_speaking_seconds(), 600);
        assert!(first.progress.daily_streak_awarded());
        assert!(first.goals_reached);
        assert_eq!(first.progress.current_streak(), 2);

        let second = tracker.record_practice_completion(
            &first.progress,
            fixed_now() + Duration::minutes(5),
            PracticeCompletion::new(500, false),
        );
        assert!(second.progress.daily_streak_awarded());
        assert!(!second.goals_reached);
    }

    #[test]
    fn vocabulary_event_counts_one_word() {
        let before = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(2)),
            daily_vocab_learned: Some(4),
            daily_speaking_seconds: Some(120),
            words_learned: Some(30),
            ..UserProgressDraft::default()
        });
        let after =
            record_practice_completion(&before, fixed_now(), PracticeCompletion::new(999, true));
        assert_eq!(after.daily_vocab_learned(), 5);
        assert_eq!(after.words_learned(), 31);
        assert_eq!(after.daily_speaking_seconds(), 120);
    }

    #[test]
    fn speaking_alone_does_not_award() {
        let before = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(1)),
            daily_speaking_seconds: Some(590),
            daily_vocab_learned: Some(2),
            ..UserProgressDraft::default()
        });
        let after = record_practice_completion(
            &before,
            fixed_now(),
            PracticeCompletion::Scored { amount: 100 },
        );
        assert_eq!(after.daily_speaking_seconds(), 600);
        assert!(!after.daily_streak_awarded());
    }

    #[test]
    fn same_day_events_never_touch_streak() {
        let tracker = StreakTracker::default();
        let mut progress = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(3)),
            current_streak: Some(7),
            ..UserProgressDraft::default()
        });
        for minute in 0..20 {
            let completion = if minute % 2 == 0 {
                PracticeCompletion::Vocabulary
            } else {
                PracticeCompletion::Scored { amount: 900 }
            };
            let outcome = tracker.record_practice_completion(
                &progress,
                fixed_now() - Duration::hours(2) + Duration::minutes(minute),
                completion,
            );
            assert_eq!(outcome.streak, StreakChange::Unchanged);
            progress = outcome.progress;
            assert_eq!(progress.current_streak(), 7);
            assert_award_invariant(&progress);
        }
        assert!(progress.daily_streak_awarded());
        assert_eq!(progress.daily_sessions_completed(), 20);
    }

    #[test]
    fn lifetime_counters_are_monotonic_across_days() {
        let tracker = StreakTracker::default();
        let mut progress = UserProgress::new();
        let start = fixed_now() - Duration::days(10);
        for step in 0..60_i64 {
            let now = start + Duration::hours(step * 5);
            let completion = PracticeCompletion::new(
                u32::try_from(step * 37 % 101).unwrap(),
                step % 3 == 0,
            );
            let next = tracker.record_practice_completion(&progress, now, completion).progress;
            assert!(next.practice_sessions_completed() >= progress.practice_sessions_completed());
            assert!(next.words_learned() >= progress.words_learned());
            assert_award_invariant(&next);
            progress = next;
        }
        assert_eq!(progress.practice_sessions_completed(), 60);
        assert_eq!(progress.words_learned(), 20);
    }

    #[test]
    fn acknowledge_milestone_is_idempotent() {
        let flagged = UserProgress::new().with_milestone(7);
        let once = acknowledge_milestone(&flagged);
        let twice = acknowledge_milestone(&once);
        assert_eq!(once.milestone_achieved(), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn closing_challenge_suppresses_it_until_tomorrow() {
        let tracker = StreakTracker::default();
        let fresh = UserProgress::new();
        assert!(tracker.daily_challenge_due(&fresh, fixed_now()));

        let closed = close_daily_challenge(&fresh, fixed_now());
        assert_eq!(closed.last_daily_challenge_at(), fixed_now());
        assert!(!tracker.daily_challenge_due(&closed, fixed_now() + Duration::minutes(30)));
        assert!(tracker.daily_challenge_due(&closed, fixed_now() + Duration::days(1)));
    }

    #[test]
    fn custom_goals_are_respected() {
        let tracker = StreakTracker::new(DailyGoals::new(10, 1), DayBoundary::utc());
        let before = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(1)),
            daily_speaking_seconds: Some(10),
            ..UserProgressDraft::default()
        });
        let outcome =
            tracker.record_practice_completion(&before, fixed_now(), PracticeCompletion::Vocabulary);
        assert!(outcome.goals_reached);
    }

    #[test]
    fn one_local_evening_is_one_day_west_of_utc() {
        // 18:00 and 20:00 at UTC-05:00 straddle midnight UTC.
        let boundary = DayBoundary::from_offset_minutes(-300).unwrap();
        let tracker = StreakTracker::new(DailyGoals::default(), boundary);
        let evening = fixed_now() + Duration::minutes(47);
        let later = evening + Duration::hours(2);
        assert_ne!(evening.date_naive(), later.date_naive());

        let first = tracker.record_practice_completion(
            &UserProgress::new(),
            evening,
            PracticeCompletion::Vocabulary,
        );
        let second = tracker.record_practice_completion(
            &first.progress,
            later,
            PracticeCompletion::Vocabulary,
        );
        assert!(!second.new_day);
        assert_eq!(second.streak, StreakChange::Unchanged);
        assert_eq!(second.progress.daily_vocab_learned(), 2);
        assert_eq!(second.progress.daily_sessions_completed(), 2);
    }

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let before = record(UserProgressDraft {
            last_practice_at: Some(fixed_now() - Duration::hours(1)),
            practice_sessions_completed: Some(u32::MAX),
            words_learned: Some(u32::MAX),
            ..UserProgressDraft::default()
        });
        let after =
            record_practice_completion(&before, fixed_now(), PracticeCompletion::Vocabulary);
        assert_eq!(after.practice_sessions_completed(), u32::MAX);
        assert_eq!(after.words_learned(), u32::MAX);
    }
}
