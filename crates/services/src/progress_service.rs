use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use speakwell_core::model::{DifficultyLevel, UserId, UserProfile};
use speakwell_core::streak::{self, DailyGoals, PracticeCompletion, StreakChange, StreakTracker};
use speakwell_core::time::DayBoundary;
use storage::repository::{ProfileRepository, StorageError};
use tracing::{debug, info};

use crate::Clock;
use crate::error::ProgressError;
use crate::milestones::MilestonePolicy;

/// Progress policy knobs loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSettings {
    pub goals: DailyGoals,
    pub boundary: DayBoundary,
    pub milestones: MilestonePolicy,
}

/// Result of feeding one completion through the tracker and persisting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeUpdate {
    pub profile: UserProfile,
    pub new_day: bool,
    pub streak: StreakChange,
    /// True only for the completion that met both daily goals.
    pub goals_reached: bool,
    /// Streak milestone reached by this completion, if any.
    pub milestone: Option<u32>,
}

/// One async lock per learner so progress updates never interleave.
///
/// Entries nobody holds or waits on are dropped on the next lookup, so the map
/// only tracks learners with updates in flight.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
        Arc::clone(map.entry(user_id).or_default())
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Owns the read-modify-write cycle around a learner's progress record.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    tracker: StreakTracker,
    milestones: MilestonePolicy,
    profiles: Arc<dyn ProfileRepository>,
    locks: Arc<UserLocks>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self::with_settings(clock, profiles, ProgressSettings::default())
    }

    #[must_use]
    pub fn with_settings(
        clock: Clock,
        profiles: Arc<dyn ProfileRepository>,
        settings: ProgressSettings,
    ) -> Self {
        Self {
            clock,
            tracker: StreakTracker::new(settings.goals, settings.boundary),
            milestones: settings.milestones,
            profiles,
            locks: Arc::new(UserLocks::default()),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn tracker(&self) -> StreakTracker {
        self.tracker
    }

    /// Fetch the learner's profile, creating one with defaults on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Profile` if the email is blank for a new learner.
    /// Returns `ProgressError::Storage` if persistence fails.
    pub async fn load_or_create_profile(
        &self,
        user_id: UserId,
        email: &str,
    ) -> Result<UserProfile, ProgressError> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        if let Some(profile) = self.profiles.get_profile(user_id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new(user_id, email, self.clock.now())?;
        match self.profiles.insert_profile(&profile).await {
            Ok(()) => {
                info!(user = %user_id, "created learner profile");
                Ok(profile)
            }
            // Another process created it first.
            Err(StorageError::Conflict) => self
                .profiles
                .get_profile(user_id)
                .await?
                .ok_or(ProgressError::UnknownUser(user_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch an existing learner's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read fails.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, ProgressError> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or(ProgressError::UnknownUser(user_id))
    }

    /// Apply one practice completion to the learner's record and persist it.
    ///
    /// Completions for the same learner are applied one at a time, each against
    /// the result of the previous one.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read or write fails.
    pub async fn record_practice(
        &self,
        user_id: UserId,
        completion: PracticeCompletion,
    ) -> Result<PracticeUpdate, ProgressError> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let mut profile = self.profile(user_id).await?;
        let now = self.clock.now();
        let outcome = self
            .tracker
            .record_practice_completion(profile.progress(), now, completion);

        let milestone = self.milestones.crossed(outcome.streak);
        let progress = match milestone {
            Some(threshold) => outcome.progress.with_milestone(threshold),
            None => outcome.progress,
        };

        debug!(
            user = %user_id,
            vocabulary = completion.is_vocabulary(),
            speaking_seconds = progress.daily_speaking_seconds(),
            vocab_learned = progress.daily_vocab_learned(),
            sessions_today = progress.daily_sessions_completed(),
            "recorded practice completion"
        );
        match outcome.streak {
            StreakChange::Continued { from, to } => {
                info!(user = %user_id, from, to, "streak continued");
            }
            StreakChange::Restarted { from } if from > 1 => {
                info!(user = %user_id, from, "streak restarted");
            }
            _ => {}
        }
        if outcome.goals_reached {
            info!(user = %user_id, streak = progress.current_streak(), "daily goals met");
        }
        if let Some(threshold) = milestone {
            info!(user = %user_id, threshold, "streak milestone reached");
        }

        profile.set_progress(progress);
        self.profiles.save_profile(&profile).await?;

        Ok(PracticeUpdate {
            profile,
            new_day: outcome.new_day,
            streak: outcome.streak,
            goals_reached: outcome.goals_reached,
            milestone,
        })
    }

    /// Clear a pending milestone celebration.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read or write fails.
    pub async fn acknowledge_milestone(
        &self,
        user_id: UserId,
    ) -> Result<UserProfile, ProgressError> {
        self.update(user_id, |profile| {
            if profile.progress().milestone_achieved() == 0 {
                return false;
            }
            let cleared = streak::acknowledge_milestone(profile.progress());
            profile.set_progress(cleared);
            true
        })
        .await
    }

    /// Mark today's daily challenge as dismissed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read or write fails.
    pub async fn close_daily_challenge(
        &self,
        user_id: UserId,
    ) -> Result<UserProfile, ProgressError> {
        let now = self.clock.now();
        self.update(user_id, |profile| {
            let closed = streak::close_daily_challenge(profile.progress(), now);
            profile.set_progress(closed);
            true
        })
        .await
    }

    /// True when the learner has not dismissed the daily challenge today.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read fails.
    pub async fn daily_challenge_due(&self, user_id: UserId) -> Result<bool, ProgressError> {
        let profile = self.profile(user_id).await?;
        Ok(self
            .tracker
            .daily_challenge_due(profile.progress(), self.clock.now()))
    }

    /// Change the learner's difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read or write fails.
    pub async fn update_difficulty(
        &self,
        user_id: UserId,
        level: DifficultyLevel,
    ) -> Result<UserProfile, ProgressError> {
        self.update(user_id, |profile| profile.set_difficulty(level)).await
    }

    /// Change the learner's stated learning goal.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Profile` if the goal is blank.
    /// Returns `ProgressError::UnknownUser` if the learner has no profile.
    /// Returns `ProgressError::Storage` if the read or write fails.
    pub async fn update_learning_goal(
        &self,
        user_id: UserId,
        goal: &str,
    ) -> Result<UserProfile, ProgressError> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let mut profile = self.profile(user_id).await?;
        if profile.set_learning_goal(goal)? {
            self.profiles.save_profile(&profile).await?;
        }
        Ok(profile)
    }

    /// Locked read-modify-write; `apply` returns whether anything changed.
    async fn update(
        &self,
        user_id: UserId,
        apply: impl FnOnce(&mut UserProfile) -> bool,
    ) -> Result<UserProfile, ProgressError> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let mut profile = self.profile(user_id).await?;
        if apply(&mut profile) {
            self.profiles.save_profile(&profile).await?;
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use speakwell_core::time::fixed_now;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::repository::InMemoryRepository;

    /// Counts writes so tests can assert when nothing is persisted.
    #[derive(Default)]
    struct CountingProfiles {
        inner: InMemoryRepository,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl ProfileRepository for CountingProfiles {
        async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
            self.inner.get_profile(id).await
        }

        async fn insert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
            self.inner.insert_profile(profile).await
        }

        async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_profile(profile).await
        }
    }

    fn service_at(
        repo: &Arc<CountingProfiles>,
        at: chrono::DateTime<chrono::Utc>,
    ) -> ProgressService {
        let profiles: Arc<dyn ProfileRepository> = repo.clone();
        ProgressService::new(Clock::fixed(at), profiles)
    }

    #[tokio::test]
    async fn load_or_create_profile_is_idempotent() {
        let repo = Arc::new(CountingProfiles::default());
        let service = service_at(&repo, fixed_now());
        let user = UserId::new(1);

        let created = service
            .load_or_create_profile(user, "a@example.com")
            .await
            .unwrap();
        assert_eq!(created.progress().current_streak(), 0);
        assert_eq!(created.difficulty(), DifficultyLevel::Beginner);

        let again = service
            .load_or_create_profile(user, "other@example.com")
            .await
            .unwrap();
        assert_eq!(again.email(), "a@example.com");
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let repo = Arc::new(CountingProfiles::default());
        let service = service_at(&repo, fixed_now());
        let err = service
            .record_practice(UserId::new(9), PracticeCompletion::Vocabulary)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::UnknownUser(id) if id == UserId::new(9)));
    }

    #[tokio::test]
    async fn unchanged_settings_are_not_written() {
        let repo = Arc::new(CountingProfiles::default());
        let service = service_at(&repo, fixed_now());
        let user = UserId::new(1);
        let profile = service
            .load_or_create_profile(user, "a@example.com")
            .await
            .unwrap();

        service
            .update_difficulty(user, DifficultyLevel::Beginner)
            .await
            .unwrap();
        service
            .update_learning_goal(user, profile.learning_goal())
            .await
            .unwrap();
        service.acknowledge_milestone(user).await.unwrap();
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);

        let updated = service
            .update_difficulty(user, DifficultyLevel::Advanced)
            .await
            .unwrap();
        assert_eq!(updated.difficulty(), DifficultyLevel::Advanced);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);

        assert!(matches!(
            service.update_learning_goal(user, "   ").await,
            Err(ProgressError::Profile(_))
        ));
    }

    #[tokio::test]
    async fn idle_user_locks_are_released() {
        let repo = Arc::new(CountingProfiles::default());
        let service = service_at(&repo, fixed_now());
        for id in 1..=10 {
            let user = UserId::new(id);
            service
                .load_or_create_profile(user, "a@example.com")
                .await
                .unwrap();
            service
                .record_practice(user, PracticeCompletion::Vocabulary)
                .await
                .unwrap();
        }
        // Only the most recent learner's entry is still cached.
        assert_eq!(service.locks.tracked(), 1);

        let held = service.locks.for_user(UserId::new(1));
        let _guard = held.lock().await;
        service.locks.for_user(UserId::new(2));
        assert_eq!(service.locks.tracked(), 2);
    }

    #[tokio::test]
    async fn daily_challenge_closes_until_tomorrow() {
        let repo = Arc::new(CountingProfiles::default());
        let today = service_at(&repo, fixed_now());
        let user = UserId::new(1);
        today
            .load_or_create_profile(user, "a@example.com")
            .await
            .unwrap();

        assert!(today.daily_challenge_due(user).await.unwrap());
        today.close_daily_challenge(user).await.unwrap();
        assert!(!today.daily_challenge_due(user).await.unwrap());

        let tomorrow = service_at(&repo, fixed_now() + Duration::days(1));
        assert!(tomorrow.daily_challenge_due(user).await.unwrap());
    }
}
