use async_trait::async_trait;
use speakwell_core::model::{
    PracticeSession, SessionId, UserId, UserProfile, VocabularyWord, WordId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Newest-first page size for practice history.
pub const HISTORY_PAGE_SIZE: u32 = 50;

/// Repository contract for learner profiles (settings plus progress record).
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by user id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing profile is `Ok(None)`.
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError>;

    /// Create a profile for a first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a profile already exists for the id.
    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    /// Overwrite an existing profile.
    ///
    /// A read immediately after this returns observes the write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no profile exists for the id.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;
}

/// Repository contract for a learner's saved vocabulary.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Persist a new word and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the word cannot be stored.
    async fn insert_word(&self, word: &VocabularyWord) -> Result<WordId, StorageError>;

    /// List a learner's words, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_words(&self, user_id: UserId) -> Result<Vec<VocabularyWord>, StorageError>;

    /// Delete one of the learner's words.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the word does not exist for this learner.
    async fn delete_word(&self, user_id: UserId, id: WordId) -> Result<(), StorageError>;
}

/// Append-only practice history.
#[async_trait]
pub trait PracticeHistoryRepository: Send + Sync {
    /// Append a finished session and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError>;

    /// Most recent sessions for a learner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<PracticeSession>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    profiles: HashMap<UserId, UserProfile>,
    words: Vec<VocabularyWord>,
    sessions: Vec<PracticeSession>,
    next_word_id: u64,
    next_session_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        f(&mut guard)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        self.with_tables(|t| Ok(t.profiles.get(&id).cloned()))
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.with_tables(|t| {
            if t.profiles.contains_key(&profile.id()) {
                return Err(StorageError::Conflict);
            }
            t.profiles.insert(profile.id(), profile.clone());
            Ok(())
        })
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.with_tables(|t| match t.profiles.get_mut(&profile.id()) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        })
    }
}

#[async_trait]
impl VocabularyRepository for InMemoryRepository {
    async fn insert_word(&self, word: &VocabularyWord) -> Result<WordId, StorageError> {
        self.with_tables(|t| {
            t.next_word_id += 1;
            let id = WordId::new(t.next_word_id);
            t.words.push(word.clone().assign_id(id));
            Ok(id)
        })
    }

    async fn list_words(&self, user_id: UserId) -> Result<Vec<VocabularyWord>, StorageError> {
        self.with_tables(|t| {
            let mut words: Vec<VocabularyWord> = t
                .words
                .iter()
                .filter(|w| w.user_id == user_id)
                .cloned()
                .collect();
            // Ties on created_at fall back to insertion order, newest first.
            words.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(words)
        })
    }

    async fn delete_word(&self, user_id: UserId, id: WordId) -> Result<(), StorageError> {
        self.with_tables(|t| {
            let before = t.words.len();
            t.words
                .retain(|w| !(w.user_id == user_id && w.id == Some(id)));
            if t.words.len() == before {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
    }
}

#[async_trait]
impl PracticeHistoryRepository for InMemoryRepository {
    async fn append_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError> {
        self.with_tables(|t| {
            t.next_session_id += 1;
            let id = SessionId::new(t.next_session_id);
            t.sessions.push(session.clone().assign_id(id));
            Ok(id)
        })
    }

    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        self.with_tables(|t| {
            let mut sessions: Vec<PracticeSession> = t
                .sessions
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            sessions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(sessions)
        })
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub vocabulary: Arc<dyn VocabularyRepository>,
    pub history: Arc<dyn PracticeHistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let vocabulary: Arc<dyn VocabularyRepository> = Arc::new(repo.clone());
        let history: Arc<dyn PracticeHistoryRepository> = Arc::new(repo);
        Self {
            profiles,
            vocabulary,
            history,
        }
    }
}
