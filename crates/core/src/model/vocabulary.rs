use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{UserId, WordId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabularyError {
    #[error("word cannot be empty")]
    EmptyWord,
    #[error("meaning cannot be empty")]
    EmptyMeaning,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A word the learner wants to keep, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyDraft {
    pub word: String,
    pub meaning: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub example_sentence: String,
    pub usage_context: String,
}

impl VocabularyDraft {
    #[must_use]
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            ..Self::default()
        }
    }

    /// Trim every field and drop blank synonyms/antonyms.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError` if the word or its meaning is blank.
    pub fn validate(
        self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<VocabularyWord, VocabularyError> {
        let word = self.word.trim().to_string();
        if word.is_empty() {
            return Err(VocabularyError::EmptyWord);
        }
        let meaning = self.meaning.trim().to_string();
        if meaning.is_empty() {
            return Err(VocabularyError::EmptyMeaning);
        }

        Ok(VocabularyWord {
            id: None,
            user_id,
            word,
            meaning,
            synonyms: clean_list(self.synonyms),
            antonyms: clean_list(self.antonyms),
            example_sentence: self.example_sentence.trim().to_string(),
            usage_context: self.usage_context.trim().to_string(),
            created_at: now,
        })
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

//
// ─── WORD ──────────────────────────────────────────────────────────────────────
//

/// A saved vocabulary entry. `id` is `None` until storage assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: Option<WordId>,
    pub user_id: UserId,
    pub word: String,
    pub meaning: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub example_sentence: String,
    pub usage_context: String,
    pub created_at: DateTime<Utc>,
}

impl VocabularyWord {
    #[must_use]
    pub fn assign_id(mut self, id: WordId) -> Self {
        self.id = Some(id);
        self
    }
}
