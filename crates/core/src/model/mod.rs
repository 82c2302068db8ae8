mod ids;
mod practice;
mod profile;
mod progress;
mod vocabulary;

pub use ids::{ParseIdError, SessionId, UserId, WordId};

pub use practice::{MAX_SCORE, PracticeSession, PracticeSessionDraft, PracticeSessionError};
pub use profile::{DEFAULT_LEARNING_GOAL, DifficultyLevel, LearningMode, ProfileError, UserProfile};
pub use progress::{UserProgress, UserProgressDraft};
pub use vocabulary::{VocabularyDraft, VocabularyError, VocabularyWord};
