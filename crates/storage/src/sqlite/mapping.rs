use chrono::{DateTime, Utc};
use speakwell_core::model::{
    DifficultyLevel, LearningMode, PracticeSession, SessionId, UserId, UserProfile,
    UserProgressDraft, VocabularyWord, WordId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn word_id_from_i64(v: i64) -> Result<WordId, StorageError> {
    Ok(WordId::new(i64_to_u64("word_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

fn optional_u32(row: &SqliteRow, column: &'static str) -> Result<Option<u32>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
        })
        .transpose()
}

pub(crate) fn parse_difficulty(s: &str) -> Result<DifficultyLevel, StorageError> {
    s.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid difficulty: {s}")))
}

pub(crate) fn parse_mode(s: &str) -> Result<LearningMode, StorageError> {
    s.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid mode: {s}")))
}

/// Word lists are stored as a JSON array of strings.
pub(crate) fn encode_list(items: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(items).map_err(ser)
}

pub(crate) fn decode_list(raw: &str) -> Result<Vec<String>, StorageError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<UserProfile, StorageError> {
    let progress = UserProgressDraft {
        current_streak: optional_u32(row, "current_streak")?,
        last_practice_at: row.try_get("last_practice_at").map_err(ser)?,
        daily_streak_awarded: row
            .try_get::<Option<bool>, _>("daily_streak_awarded")
            .map_err(ser)?,
        daily_speaking_seconds: optional_u32(row, "daily_speaking_seconds")?,
        daily_vocab_learned: optional_u32(row, "daily_vocab_learned")?,
        daily_sessions_completed: optional_u32(row, "daily_sessions_completed")?,
        practice_sessions_completed: optional_u32(row, "practice_sessions_completed")?,
        words_learned: optional_u32(row, "words_learned")?,
        milestone_achieved: optional_u32(row, "milestone_achieved")?,
        last_daily_challenge_at: row.try_get("last_daily_challenge_at").map_err(ser)?,
    }
    .normalize();

    let difficulty_str: String = row.try_get("difficulty").map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

    UserProfile::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get("email").map_err(ser)?,
        row.try_get("learning_goal").map_err(ser)?,
        parse_difficulty(&difficulty_str)?,
        progress,
        created_at,
    )
    .map_err(ser)
}

pub(crate) fn map_word_row(row: &SqliteRow) -> Result<VocabularyWord, StorageError> {
    let synonyms: String = row.try_get("synonyms").map_err(ser)?;
    let antonyms: String = row.try_get("antonyms").map_err(ser)?;
    Ok(VocabularyWord {
        id: Some(word_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?),
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        word: row.try_get("word").map_err(ser)?,
        meaning: row.try_get("meaning").map_err(ser)?,
        synonyms: decode_list(&synonyms)?,
        antonyms: decode_list(&antonyms)?,
        example_sentence: row.try_get("example_sentence").map_err(ser)?,
        usage_context: row.try_get("usage_context").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<PracticeSession, StorageError> {
    let mode: String = row.try_get("mode").map_err(ser)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    Ok(PracticeSession {
        id: Some(session_id_from_i64(
            row.try_get::<i64, _>("id").map_err(ser)?,
        )?),
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        mode: parse_mode(&mode)?,
        difficulty: parse_difficulty(&difficulty)?,
        score: optional_u32(row, "score")?,
        prompt: row.try_get("prompt").map_err(ser)?,
        user_response: row.try_get("user_response").map_err(ser)?,
        feedback: row.try_get("feedback").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
