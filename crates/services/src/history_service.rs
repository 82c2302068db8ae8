use std::sync::Arc;

use speakwell_core::model::{LearningMode, PracticeSession, PracticeSessionDraft, UserId};
use speakwell_core::streak::PracticeCompletion;
use storage::repository::{HISTORY_PAGE_SIZE, PracticeHistoryRepository};
use tracing::debug;

use crate::error::HistoryError;
use crate::progress_service::{PracticeUpdate, ProgressService};

/// A stored history entry plus any progress it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSession {
    pub session: PracticeSession,
    /// `None` for modes that do not count toward daily progress.
    pub update: Option<PracticeUpdate>,
}

/// Which tracker event a finished session produces, if any.
#[must_use]
pub fn completion_for(session: &PracticeSession) -> Option<PracticeCompletion> {
    if !session.mode.counts_toward_progress() {
        return None;
    }
    let amount = match session.mode {
        LearningMode::Speaking => session.score.unwrap_or(0),
        _ => 0,
    };
    Some(PracticeCompletion::Scored { amount })
}

/// Practice history log that also feeds finished sessions into progress.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn PracticeHistoryRepository>,
    progress: Arc<ProgressService>,
}

impl HistoryService {
    #[must_use]
    pub fn new(
        history: Arc<dyn PracticeHistoryRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self { history, progress }
    }

    /// Stamp and store a finished session, then update daily progress.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Session` for an out-of-range score.
    /// Returns `HistoryError::Progress` if the learner has no profile.
    /// Returns `HistoryError::Storage` if persistence fails.
    pub async fn record_session(
        &self,
        draft: PracticeSessionDraft,
    ) -> Result<RecordedSession, HistoryError> {
        let user_id = draft.user_id;
        self.progress.profile(user_id).await?;
        let session = draft.validate(self.progress.clock().now())?;
        let id = self.history.append_session(&session).await?;
        debug!(
            user = %user_id,
            mode = %session.mode,
            score = ?session.score,
            "appended practice session"
        );

        let update = match completion_for(&session) {
            Some(completion) => Some(self.progress.record_practice(user_id, completion).await?),
            None => None,
        };
        Ok(RecordedSession {
            session: session.assign_id(id),
            update,
        })
    }

    /// The learner's latest sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if the read fails.
    pub async fn recent(&self, user_id: UserId) -> Result<Vec<PracticeSession>, HistoryError> {
        Ok(self
            .history
            .recent_sessions(user_id, HISTORY_PAGE_SIZE)
            .await?)
    }
}
