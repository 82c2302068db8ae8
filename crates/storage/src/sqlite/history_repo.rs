use async_trait::async_trait;
use speakwell_core::model::{PracticeSession, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_session_row, session_id_from_i64};
use crate::repository::{PracticeHistoryRepository, StorageError};

#[async_trait]
impl PracticeHistoryRepository for SqliteRepository {
    async fn append_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO practice_sessions (
                user_id, mode, difficulty, score, prompt, user_response, feedback, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(id_to_i64("user_id", session.user_id.value())?)
        .bind(session.mode.as_str())
        .bind(session.difficulty.as_str())
        .bind(session.score.map(i64::from))
        .bind(session.prompt.as_deref())
        .bind(session.user_response.as_deref())
        .bind(session.feedback.as_deref())
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        session_id_from_i64(res.last_insert_rowid())
    }

    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, user_id, mode, difficulty, score,
                prompt, user_response, feedback, created_at
            FROM practice_sessions
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_session_row).collect()
    }
}
