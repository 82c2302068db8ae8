use async_trait::async_trait;
use speakwell_core::model::{UserId, VocabularyWord, WordId};

use super::SqliteRepository;
use super::mapping::{encode_list, id_to_i64, map_word_row, word_id_from_i64};
use crate::repository::{StorageError, VocabularyRepository};

#[async_trait]
impl VocabularyRepository for SqliteRepository {
    async fn insert_word(&self, word: &VocabularyWord) -> Result<WordId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO vocabulary_words (
                user_id, word, meaning, synonyms, antonyms,
                example_sentence, usage_context, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(id_to_i64("user_id", word.user_id.value())?)
        .bind(word.word.as_str())
        .bind(word.meaning.as_str())
        .bind(encode_list(&word.synonyms)?)
        .bind(encode_list(&word.antonyms)?)
        .bind(word.example_sentence.as_str())
        .bind(word.usage_context.as_str())
        .bind(word.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        word_id_from_i64(res.last_insert_rowid())
    }

    async fn list_words(&self, user_id: UserId) -> Result<Vec<VocabularyWord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, user_id, word, meaning, synonyms, antonyms,
                example_sentence, usage_context, created_at
            FROM vocabulary_words
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_word_row).collect()
    }

    async fn delete_word(&self, user_id: UserId, id: WordId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM vocabulary_words WHERE id = ?1 AND user_id = ?2")
            .bind(id_to_i64("word_id", id.value())?)
            .bind(id_to_i64("user_id", user_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
