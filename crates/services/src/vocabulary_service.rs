use std::sync::Arc;

use speakwell_core::model::{UserId, VocabularyDraft, VocabularyWord, WordId};
use speakwell_core::streak::PracticeCompletion;
use storage::repository::VocabularyRepository;
use tracing::debug;

use crate::error::VocabularyServiceError;
use crate::progress_service::{PracticeUpdate, ProgressService};

/// A stored word plus the progress it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedWord {
    pub word: VocabularyWord,
    pub update: PracticeUpdate,
}

/// The learner's vocabulary notebook.
#[derive(Clone)]
pub struct VocabularyService {
    words: Arc<dyn VocabularyRepository>,
    progress: Arc<ProgressService>,
}

impl VocabularyService {
    #[must_use]
    pub fn new(words: Arc<dyn VocabularyRepository>, progress: Arc<ProgressService>) -> Self {
        Self { words, progress }
    }

    /// Validate and store a word, then count it toward today's vocabulary goal.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyServiceError::Vocabulary` for validation failures.
    /// Returns `VocabularyServiceError::Progress` if the learner has no profile.
    /// Returns `VocabularyServiceError::Storage` if persistence fails.
    pub async fn save_word(
        &self,
        user_id: UserId,
        draft: VocabularyDraft,
    ) -> Result<SavedWord, VocabularyServiceError> {
        self.progress.profile(user_id).await?;
        let word = draft.validate(user_id, self.progress.clock().now())?;
        let id = self.words.insert_word(&word).await?;
        debug!(user = %user_id, word_id = %id, "saved vocabulary word");

        let update = self
            .progress
            .record_practice(user_id, PracticeCompletion::Vocabulary)
            .await?;
        Ok(SavedWord {
            word: word.assign_id(id),
            update,
        })
    }

    /// The learner's words, newest first.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyServiceError::Storage` if the read fails.
    pub async fn list_words(
        &self,
        user_id: UserId,
    ) -> Result<Vec<VocabularyWord>, VocabularyServiceError> {
        Ok(self.words.list_words(user_id).await?)
    }

    /// Remove a word from the notebook. Progress already earned is kept.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyServiceError::Storage` if the word does not exist or
    /// the delete fails.
    pub async fn delete_word(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<(), VocabularyServiceError> {
        self.words.delete_word(user_id, word_id).await?;
        debug!(user = %user_id, word_id = %word_id, "deleted vocabulary word");
        Ok(())
    }
}
