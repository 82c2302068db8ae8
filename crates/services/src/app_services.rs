use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::daily_challenge::DailyChallengeService;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::progress_service::{ProgressService, ProgressSettings};
use crate::vocabulary_service::VocabularyService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    vocabulary: Arc<VocabularyService>,
    history: Arc<HistoryService>,
    daily_challenge: Arc<DailyChallengeService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ProgressSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over fresh in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: ProgressSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: ProgressSettings) -> Self {
        let progress = Arc::new(ProgressService::with_settings(
            clock,
            Arc::clone(&storage.profiles),
            settings,
        ));
        let vocabulary = Arc::new(VocabularyService::new(
            Arc::clone(&storage.vocabulary),
            Arc::clone(&progress),
        ));
        let history = Arc::new(HistoryService::new(
            Arc::clone(&storage.history),
            Arc::clone(&progress),
        ));
        let daily_challenge = Arc::new(DailyChallengeService::new(
            Arc::clone(&storage.vocabulary),
            Arc::clone(&progress),
        ));

        Self {
            progress,
            vocabulary,
            history,
            daily_challenge,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn vocabulary(&self) -> Arc<VocabularyService> {
        Arc::clone(&self.vocabulary)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn daily_challenge(&self) -> Arc<DailyChallengeService> {
        Arc::clone(&self.daily_challenge)
    }
}
