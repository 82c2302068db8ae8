use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::progress::UserProgress;

/// Learning goal assigned to accounts that have not picked their own yet.
pub const DEFAULT_LEARNING_GOAL: &str = "Get fluent in English for my career.";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("learning goal cannot be empty")]
    EmptyLearningGoal,
    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),
    #[error("unknown learning mode: {0}")]
    UnknownMode(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty the learner practises at; generated exercises follow it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ProfileError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── LEARNING MODE ─────────────────────────────────────────────────────────────
//

/// The skill a practice session exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningMode {
    Speaking,
    Writing,
    Reading,
    Listening,
    Grammar,
    Vocabulary,
}

impl LearningMode {
    pub const ALL: [LearningMode; 6] = [
        LearningMode::Speaking,
        LearningMode::Writing,
        LearningMode::Reading,
        LearningMode::Listening,
        LearningMode::Grammar,
        LearningMode::Vocabulary,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LearningMode::Speaking => "speaking",
            LearningMode::Writing => "writing",
            LearningMode::Reading => "reading",
            LearningMode::Listening => "listening",
            LearningMode::Grammar => "grammar",
            LearningMode::Vocabulary => "vocabulary",
        }
    }

    /// Whether finishing a session in this mode counts as a practice completion.
    ///
    /// Reading and listening are self-checked and never feed the daily counters;
    /// vocabulary is counted per saved word instead of per session.
    #[must_use]
    pub fn counts_toward_progress(self) -> bool {
        matches!(
            self,
            LearningMode::Speaking | LearningMode::Writing | LearningMode::Grammar
        )
    }
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningMode {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == needle)
            .ok_or_else(|| ProfileError::UnknownMode(s.to_string()))
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// A learner's account settings plus their progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    id: UserId,
    email: String,
    learning_goal: String,
    difficulty: DifficultyLevel,
    progress: UserProgress,
    created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile for a first sign-in: default goal, beginner level, zeroed progress.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyEmail` if the email is blank.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        Self::from_persisted(
            id,
            email.into(),
            DEFAULT_LEARNING_GOAL.to_string(),
            DifficultyLevel::default(),
            UserProgress::new(),
            created_at,
        )
    }

    /// Rehydrate a profile from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if email or learning goal are blank.
    pub fn from_persisted(
        id: UserId,
        email: String,
        learning_goal: String,
        difficulty: DifficultyLevel,
        progress: UserProgress,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        let email = non_empty(email).ok_or(ProfileError::EmptyEmail)?;
        let learning_goal = non_empty(learning_goal).ok_or(ProfileError::EmptyLearningGoal)?;
        Ok(Self {
            id,
            email,
            learning_goal,
            difficulty,
            progress,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn learning_goal(&self) -> &str {
        &self.learning_goal
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_progress(&mut self, progress: UserProgress) {
        self.progress = progress;
    }

    /// Returns `true` if the level changed.
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) -> bool {
        if self.difficulty == difficulty {
            return false;
        }
        self.difficulty = difficulty;
        true
    }

    /// Returns `Ok(true)` if the goal changed.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyLearningGoal` if the goal is blank.
    pub fn set_learning_goal(&mut self, goal: impl Into<String>) -> Result<bool, ProfileError> {
        let goal = non_empty(goal.into()).ok_or(ProfileError::EmptyLearningGoal)?;
        if self.learning_goal == goal {
            return Ok(false);
        }
        self.learning_goal = goal;
        Ok(true)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
