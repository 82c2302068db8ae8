#![forbid(unsafe_code)]

pub mod app_services;
pub mod daily_challenge;
pub mod error;
pub mod history_service;
pub mod milestones;
pub mod progress_service;
pub mod vocabulary_service;

pub use speakwell_core::Clock;

pub use app_services::AppServices;
pub use daily_challenge::{DailyChallenge, DailyChallengeService, Quiz, QuizQuestion};
pub use error::{
    AppServicesError, DailyChallengeError, HistoryError, ProgressError, QuizError,
    VocabularyServiceError,
};
pub use history_service::{HistoryService, RecordedSession};
pub use milestones::{DEFAULT_MILESTONES, MilestonePolicy};
pub use progress_service::{PracticeUpdate, ProgressService, ProgressSettings};
pub use vocabulary_service::{SavedWord, VocabularyService};
