use chrono::Duration;
use speakwell_core::model::{
    DifficultyLevel, LearningMode, PracticeSessionDraft, UserId, UserProfile, VocabularyDraft,
};
use speakwell_core::streak::{PracticeCompletion, StreakTracker};
use speakwell_core::time::fixed_now;
use sqlx::Row;
use storage::repository::{
    PracticeHistoryRepository, ProfileRepository, StorageError, VocabularyRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_profile_progress_round_trip() {
    let repo = connect("memdb_profile").await;
    let mut profile =
        UserProfile::new(UserId::new(7), "learner@example.com", fixed_now()).unwrap();
    repo.insert_profile(&profile).await.unwrap();

    let tracker = StreakTracker::default();
    let mut progress = profile.progress().clone();
    for i in 0..3 {
        progress = tracker
            .record_practice_completion(
                &progress,
                fixed_now() + Duration::minutes(i),
                PracticeCompletion::Vocabulary,
            )
            .progress;
    }
    profile.set_progress(progress.with_milestone(3));
    profile.set_difficulty(DifficultyLevel::Advanced);
    repo.save_profile(&profile).await.unwrap();

    let fetched = repo.get_profile(UserId::new(7)).await.unwrap().unwrap();
    assert_eq!(fetched, profile);
    assert_eq!(fetched.progress().daily_vocab_learned(), 3);
    assert_eq!(fetched.progress().milestone_achieved(), 3);
    assert_eq!(fetched.difficulty(), DifficultyLevel::Advanced);

    assert!(repo.get_profile(UserId::new(8)).await.unwrap().is_none());
    assert!(matches!(
        repo.insert_profile(&profile).await,
        Err(StorageError::Conflict)
    ));
}

#[tokio::test]
async fn sqlite_normalizes_missing_progress_columns() {
    let repo = connect("memdb_legacy").await;
    sqlx::query(
        r"
        INSERT INTO profiles (id, email, learning_goal, difficulty, created_at)
        VALUES (1, 'old@example.com', 'Speak better', 'beginner', ?1)
        ",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let profile = repo.get_profile(UserId::new(1)).await.unwrap().unwrap();
    let progress = profile.progress();
    assert_eq!(progress.current_streak(), 0);
    assert_eq!(progress.last_practice_at().timestamp(), 0);
    assert!(!progress.daily_streak_awarded());

    let row = sqlx::query("SELECT COUNT(*) AS n FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("n"), 1);
}

#[tokio::test]
async fn sqlite_vocabulary_and_history() {
    let repo = connect("memdb_vocab_history").await;
    let user = UserId::new(3);
    repo.insert_profile(&UserProfile::new(user, "v@example.com", fixed_now()).unwrap())
        .await
        .unwrap();

    let mut draft = VocabularyDraft::new("meticulous", "অতি যত্নশীল");
    draft.synonyms = vec!["careful".into(), "precise".into()];
    let first = draft.validate(user, fixed_now()).unwrap();
    let second = VocabularyDraft::new("vivid", "প্রাণবন্ত")
        .validate(user, fixed_now() + Duration::seconds(1))
        .unwrap();
    let first_id = repo.insert_word(&first).await.unwrap();
    repo.insert_word(&second).await.unwrap();

    let words = repo.list_words(user).await.unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].word, "vivid");
    assert_eq!(words[1].synonyms, vec!["careful".to_string(), "precise".to_string()]);

    repo.delete_word(user, first_id).await.unwrap();
    assert!(matches!(
        repo.delete_word(user, first_id).await,
        Err(StorageError::NotFound)
    ));

    for i in 0..3 {
        let session =
            PracticeSessionDraft::new(user, LearningMode::Speaking, DifficultyLevel::Beginner)
                .with_score(70 + i)
                .validate(fixed_now() + Duration::minutes(i64::from(i)))
                .unwrap();
        repo.append_session(&session).await.unwrap();
    }
    let recent = repo.recent_sessions(user, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].score, Some(72));
    assert_eq!(recent[0].mode, LearningMode::Speaking);
}
