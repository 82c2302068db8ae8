use async_trait::async_trait;
use speakwell_core::model::{UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_profile_row};
use crate::repository::{ProfileRepository, StorageError};

fn write_err(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(err.to_string()),
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, email, learning_goal, difficulty,
                current_streak, last_practice_at, daily_streak_awarded,
                daily_speaking_seconds, daily_vocab_learned, daily_sessions_completed,
                practice_sessions_completed, words_learned, milestone_achieved,
                last_daily_challenge_at, created_at
            FROM profiles
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let progress = profile.progress();
        sqlx::query(
            r"
            INSERT INTO profiles (
                id, email, learning_goal, difficulty,
                current_streak, last_practice_at, daily_streak_awarded,
                daily_speaking_seconds, daily_vocab_learned, daily_sessions_completed,
                practice_sessions_completed, words_learned, milestone_achieved,
                last_daily_challenge_at, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ",
        )
        .bind(id_to_i64("user_id", profile.id().value())?)
        .bind(profile.email())
        .bind(profile.learning_goal())
        .bind(profile.difficulty().as_str())
        .bind(i64::from(progress.current_streak()))
        .bind(progress.last_practice_at())
        .bind(progress.daily_streak_awarded())
        .bind(i64::from(progress.daily_speaking_seconds()))
        .bind(i64::from(progress.daily_vocab_learned()))
        .bind(i64::from(progress.daily_sessions_completed()))
        .bind(i64::from(progress.practice_sessions_completed()))
        .bind(i64::from(progress.words_learned()))
        .bind(i64::from(progress.milestone_achieved()))
        .bind(progress.last_daily_challenge_at())
        .bind(profile.created_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let progress = profile.progress();
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET email = ?2,
                learning_goal = ?3,
                difficulty = ?4,
                current_streak = ?5,
                last_practice_at = ?6,
                daily_streak_awarded = ?7,
                daily_speaking_seconds = ?8,
                daily_vocab_learned = ?9,
                daily_sessions_completed = ?10,
                practice_sessions_completed = ?11,
                words_learned = ?12,
                milestone_achieved = ?13,
                last_daily_challenge_at = ?14
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("user_id", profile.id().value())?)
        .bind(profile.email())
        .bind(profile.learning_goal())
        .bind(profile.difficulty().as_str())
        .bind(i64::from(progress.current_streak()))
        .bind(progress.last_practice_at())
        .bind(progress.daily_streak_awarded())
        .bind(i64::from(progress.daily_speaking_seconds()))
        .bind(i64::from(progress.daily_vocab_learned()))
        .bind(i64::from(progress.daily_sessions_completed()))
        .bind(i64::from(progress.practice_sessions_completed()))
        .bind(i64::from(progress.words_learned()))
        .bind(i64::from(progress.milestone_achieved()))
        .bind(progress.last_daily_challenge_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
