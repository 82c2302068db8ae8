use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates profiles (settings plus progress counters), saved vocabulary and
/// practice history, with their lookup indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        // Progress columns are nullable: rows written by older clients may lack
        // any of them and are normalized on read.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS profiles (
                    id INTEGER PRIMARY KEY,
                    email TEXT NOT NULL,
                    learning_goal TEXT NOT NULL,
                    difficulty TEXT NOT NULL,
                    current_streak INTEGER CHECK (current_streak >= 0),
                    last_practice_at TEXT,
                    daily_streak_awarded INTEGER,
                    daily_speaking_seconds INTEGER CHECK (daily_speaking_seconds >= 0),
                    daily_vocab_learned INTEGER CHECK (daily_vocab_learned >= 0),
                    daily_sessions_completed INTEGER CHECK (daily_sessions_completed >= 0),
                    practice_sessions_completed INTEGER CHECK (practice_sessions_completed >= 0),
                    words_learned INTEGER CHECK (words_learned >= 0),
                    milestone_achieved INTEGER CHECK (milestone_achieved >= 0),
                    last_daily_challenge_at TEXT,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS vocabulary_words (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    word TEXT NOT NULL,
                    meaning TEXT NOT NULL,
                    synonyms TEXT NOT NULL,
                    antonyms TEXT NOT NULL,
                    example_sentence TEXT NOT NULL,
                    usage_context TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS practice_sessions (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    mode TEXT NOT NULL,
                    difficulty TEXT NOT NULL,
                    score INTEGER CHECK (score BETWEEN 0 AND 100),
                    prompt TEXT,
                    user_response TEXT,
                    feedback TEXT,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_vocabulary_words_user_created
                    ON vocabulary_words (user_id, created_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_practice_sessions_user_created
                    ON practice_sessions (user_id, created_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
