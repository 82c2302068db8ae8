use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::epoch;

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Daily and lifetime practice counters for one learner.
///
/// The record is a plain value: the streak tracker takes one snapshot and hands
/// back the next. Daily counters describe the calendar day of
/// `last_practice_at`; they are reset lazily by the next practice event on a
/// later day, never by a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub(crate) current_streak: u32,
    pub(crate) last_practice_at: DateTime<Utc>,
    pub(crate) daily_streak_awarded: bool,
    pub(crate) daily_speaking_seconds: u32,
    pub(crate) daily_vocab_learned: u32,
    pub(crate) daily_sessions_completed: u32,
    pub(crate) practice_sessions_completed: u32,
    pub(crate) words_learned: u32,
    pub(crate) milestone_achieved: u32,
    pub(crate) last_daily_challenge_at: DateTime<Utc>,
}

impl UserProgress {
    /// A fresh record for a newly created account.
    ///
    /// Both dates sit at the Unix epoch so the first practice event always
    /// starts a new day and the daily challenge is due straight away.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_streak: 0,
            last_practice_at: epoch(),
            daily_streak_awarded: false,
            daily_speaking_seconds: 0,
            daily_vocab_learned: 0,
            daily_sessions_completed: 0,
            practice_sessions_completed: 0,
            words_learned: 0,
            milestone_achieved: 0,
            last_daily_challenge_at: epoch(),
        }
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn last_practice_at(&self) -> DateTime<Utc> {
        self.last_practice_at
    }

    #[must_use]
    pub fn daily_streak_awarded(&self) -> bool {
        self.daily_streak_awarded
    }

    #[must_use]
    pub fn daily_speaking_seconds(&self) -> u32 {
        self.daily_speaking_seconds
    }

    #[must_use]
    pub fn daily_vocab_learned(&self) -> u32 {
        self.daily_vocab_learned
    }

    #[must_use]
    pub fn daily_sessions_completed(&self) -> u32 {
        self.daily_sessions_completed
    }

    #[must_use]
    pub fn practice_sessions_completed(&self) -> u32 {
        self.practice_sessions_completed
    }

    #[must_use]
    pub fn words_learned(&self) -> u32 {
        self.words_learned
    }

    /// Streak length awaiting a celebration, or 0 when there is none.
    #[must_use]
    pub fn milestone_achieved(&self) -> u32 {
        self.milestone_achieved
    }

    #[must_use]
    pub fn last_daily_challenge_at(&self) -> DateTime<Utc> {
        self.last_daily_challenge_at
    }

    /// Returns a copy flagged with a milestone for the UI to celebrate.
    #[must_use]
    pub fn with_milestone(mut self, streak_length: u32) -> Self {
        self.milestone_achieved = streak_length;
        self
    }
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Loosely typed progress as it may come back from storage.
///
/// Older rows and partially written documents can lack any of the counters;
/// normalization treats a missing number as 0, a missing flag as `false` and a
/// missing date as the epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgressDraft {
    pub current_streak: Option<u32>,
    pub last_practice_at: Option<DateTime<Utc>>,
    pub daily_streak_awarded: Option<bool>,
    pub daily_speaking_seconds: Option<u32>,
    pub daily_vocab_learned: Option<u32>,
    pub daily_sessions_completed: Option<u32>,
    pub practice_sessions_completed: Option<u32>,
    pub words_learned: Option<u32>,
    pub milestone_achieved: Option<u32>,
    pub last_daily_challenge_at: Option<DateTime<Utc>>,
}

impl UserProgressDraft {
    /// Fill in defaults for every missing field.
    #[must_use]
    pub fn normalize(self) -> UserProgress {
        UserProgress {
            current_streak: self.current_streak.unwrap_or(0),
            last_practice_at: self.last_practice_at.unwrap_or_else(epoch),
            daily_streak_awarded: self.daily_streak_awarded.unwrap_or(false),
            daily_speaking_seconds: self.daily_speaking_seconds.unwrap_or(0),
            daily_vocab_learned: self.daily_vocab_learned.unwrap_or(0),
            daily_sessions_completed: self.daily_sessions_completed.unwrap_or(0),
            practice_sessions_completed: self.practice_sessions_completed.unwrap_or(0),
            words_learned: self.words_learned.unwrap_or(0),
            milestone_achieved: self.milestone_achieved.unwrap_or(0),
            last_daily_challenge_at: self.last_daily_challenge_at.unwrap_or_else(epoch),
        }
    }
}

impl From<&UserProgress> for UserProgressDraft {
    fn from(progress: &UserProgress) -> Self {
        Self {
            current_streak: Some(progress.current_streak),
            last_practice_at: Some(progress.last_practice_at),
            daily_streak_awarded: Some(progress.daily_streak_awarded),
            daily_speaking_seconds: Some(progress.daily_speaking_seconds),
            daily_vocab_learned: Some(progress.daily_vocab_learned),
            daily_sessions_completed: Some(progress.daily_sessions_completed),
            practice_sessions_completed: Some(progress.practice_sessions_completed),
            words_learned: Some(progress.words_learned),
            milestone_achieved: Some(progress.milestone_achieved),
            last_daily_challenge_at: Some(progress.last_daily_challenge_at),
        }
    }
}
