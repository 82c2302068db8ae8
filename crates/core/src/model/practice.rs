use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SessionId, UserId};
use crate::model::profile::{DifficultyLevel, LearningMode};

/// Upper bound for pronunciation scores.
pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeSessionError {
    #[error("score must be between 0 and {MAX_SCORE}, got {0}")]
    ScoreOutOfRange(u32),
}

/// What the learner submits when finishing an exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSessionDraft {
    pub user_id: UserId,
    pub mode: LearningMode,
    pub difficulty: DifficultyLevel,
    pub score: Option<u32>,
    pub prompt: Option<String>,
    pub user_response: Option<String>,
    pub feedback: Option<String>,
}

impl PracticeSessionDraft {
    #[must_use]
    pub fn new(user_id: UserId, mode: LearningMode, difficulty: DifficultyLevel) -> Self {
        Self {
            user_id,
            mode,
            difficulty,
            score: None,
            prompt: None,
            user_response: None,
            feedback: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }

    /// Stamp the entry and normalize blank text to `None`.
    ///
    /// # Errors
    ///
    /// Returns `PracticeSessionError::ScoreOutOfRange` for scores above `MAX_SCORE`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<PracticeSession, PracticeSessionError> {
        if let Some(score) = self.score {
            if score > MAX_SCORE {
                return Err(PracticeSessionError::ScoreOutOfRange(score));
            }
        }
        Ok(PracticeSession {
            id: None,
            user_id: self.user_id,
            mode: self.mode,
            difficulty: self.difficulty,
            score: self.score,
            prompt: normalize_optional(self.prompt),
            user_response: normalize_optional(self.user_response),
            feedback: normalize_optional(self.feedback),
            created_at: now,
        })
    }
}

/// One entry in a learner's practice history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: Option<SessionId>,
    pub user_id: UserId,
    pub mode: LearningMode,
    pub difficulty: DifficultyLevel,
    pub score: Option<u32>,
    pub prompt: Option<String>,
    pub user_response: Option<String>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PracticeSession {
    #[must_use]
    pub fn assign_id(mut self, id: SessionId) -> Self {
        self.id = Some(id);
        self
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_scores_above_max() {
        let draft = PracticeSessionDraft::new(
            UserId::new(1),
            LearningMode::Speaking,
            DifficultyLevel::Beginner,
        )
        .with_score(101);
        assert_eq!(
            draft.validate(fixed_now()).unwrap_err(),
            PracticeSessionError::ScoreOutOfRange(101)
        );
    }

    #[test]
    fn blank_text_becomes_none() {
        let mut draft = PracticeSessionDraft::new(
            UserId::new(1),
            LearningMode::Writing,
            DifficultyLevel::Advanced,
        );
        draft.prompt = Some("Describe your city".into());
        draft.user_response = Some("   ".into());
        let session = draft.validate(fixed_now()).unwrap();
        assert_eq!(session.prompt.as_deref(), Some("Describe your city"));
        assert_eq!(session.user_response, None);
        assert_eq!(session.created_at, fixed_now());
    }
}
