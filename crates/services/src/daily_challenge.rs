use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use speakwell_core::model::{UserId, UserProfile, VocabularyWord, WordId};
use storage::repository::VocabularyRepository;
use tracing::debug;

use crate::error::{DailyChallengeError, QuizError};
use crate::progress_service::ProgressService;

/// Fewest saved words needed before a quiz can be built.
pub const MIN_QUIZ_WORDS: usize = 4;
/// Most questions in one quiz.
pub const MAX_QUIZ_QUESTIONS: usize = 5;
/// Wrong options offered alongside the correct meaning.
pub const DISTRACTORS_PER_QUESTION: usize = 3;

/// What the learner sees when the daily challenge opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyChallenge {
    /// Too few saved words; only speaking tips are shown.
    TipsOnly,
    Quiz(Quiz),
}

/// "What does this word mean?" with shuffled options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    word_id: Option<WordId>,
    word: String,
    options: Vec<String>,
    correct_answer: String,
    answered: Option<bool>,
}

impl QuizQuestion {
    #[must_use]
    pub fn word_id(&self) -> Option<WordId> {
        self.word_id
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// `Some(correct)` once answered.
    #[must_use]
    pub fn answered(&self) -> Option<bool> {
        self.answered
    }
}

/// A vocabulary quiz over the learner's saved words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Build a quiz from saved words, or `None` when there are too few.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(words: &[VocabularyWord], rng: &mut R) -> Option<Self> {
        if words.len() < MIN_QUIZ_WORDS {
            return None;
        }

        let mut pool: Vec<&VocabularyWord> = words.iter().collect();
        pool.shuffle(rng);

        let questions = pool
            .iter()
            .take(MAX_QUIZ_QUESTIONS)
            .map(|correct| {
                let mut others: Vec<&str> = pool
                    .iter()
                    .filter(|w| w.id != correct.id && w.meaning != correct.meaning)
                    .map(|w| w.meaning.as_str())
                    .collect();
                others.sort_unstable();
                others.dedup();
                others.shuffle(rng);

                let mut options: Vec<String> = others
                    .into_iter()
                    .take(DISTRACTORS_PER_QUESTION)
                    .map(str::to_owned)
                    .collect();
                options.push(correct.meaning.clone());
                options.shuffle(rng);

                QuizQuestion {
                    word_id: correct.id,
                    word: correct.word.clone(),
                    options,
                    correct_answer: correct.meaning.clone(),
                    answered: None,
                }
            })
            .collect();

        Some(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Answer question `index` with one of its options; returns whether it was right.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSuchQuestion` for an out-of-range index,
    /// `QuizError::AlreadyAnswered` on a second attempt and
    /// `QuizError::NotAnOption` if `choice` was not offered.
    pub fn answer(&mut self, index: usize, choice: &str) -> Result<bool, QuizError> {
        let len = self.questions.len();
        let question = self
            .questions
            .get_mut(index)
            .ok_or(QuizError::NoSuchQuestion { index, len })?;
        if question.answered.is_some() {
            return Err(QuizError::AlreadyAnswered(index));
        }
        if !question.options.iter().any(|o| o == choice) {
            return Err(QuizError::NotAnOption(choice.to_owned()));
        }
        let correct = choice == question.correct_answer;
        question.answered = Some(correct);
        Ok(correct)
    }

    /// Number of correctly answered questions.
    #[must_use]
    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.answered == Some(true))
            .count()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.questions.iter().all(|q| q.answered.is_some())
    }
}

/// Builds and closes the once-a-day challenge.
#[derive(Clone)]
pub struct DailyChallengeService {
    words: Arc<dyn VocabularyRepository>,
    progress: Arc<ProgressService>,
}

impl DailyChallengeService {
    #[must_use]
    pub fn new(words: Arc<dyn VocabularyRepository>, progress: Arc<ProgressService>) -> Self {
        Self { words, progress }
    }

    /// True when the challenge should be offered today.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::Progress` if the learner is unknown or the read fails.
    pub async fn is_due(&self, user_id: UserId) -> Result<bool, DailyChallengeError> {
        Ok(self.progress.daily_challenge_due(user_id).await?)
    }

    /// Build today's quiz from the learner's saved words.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::Storage` if the words cannot be read.
    pub async fn build_quiz<R: Rng + ?Sized>(
        &self,
        user_id: UserId,
        rng: &mut R,
    ) -> Result<DailyChallenge, DailyChallengeError> {
        let words = self.words.list_words(user_id).await?;
        let challenge = match Quiz::generate(&words, rng) {
            Some(quiz) => {
                debug!(user = %user_id, questions = quiz.len(), "built daily quiz");
                DailyChallenge::Quiz(quiz)
            }
            None => {
                debug!(user = %user_id, saved = words.len(), "too few words for a quiz");
                DailyChallenge::TipsOnly
            }
        };
        Ok(challenge)
    }

    /// Dismiss the challenge until tomorrow.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::Progress` if the learner is unknown or the write fails.
    pub async fn close(&self, user_id: UserId) -> Result<UserProfile, DailyChallengeError> {
        Ok(self.progress.close_daily_challenge(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use speakwell_core::model::VocabularyDraft;
    use speakwell_core::time::fixed_now;

    fn words(n: u64) -> Vec<VocabularyWord> {
        (1..=n)
            .map(|i| {
                VocabularyDraft::new(format!("word{i}"), format!("meaning{i}"))
                    .validate(UserId::new(1), fixed_now() + Duration::seconds(i as i64))
                    .unwrap()
                    .assign_id(WordId::new(i))
            })
            .collect()
    }

    #[test]
    fn too_few_words_means_no_quiz() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(Quiz::generate(&words(3), &mut rng).is_none());
        assert!(Quiz::generate(&[], &mut rng).is_none());
    }

    #[test]
    fn four_words_give_four_questions_with_four_options() {
        let mut rng = StdRng::seed_from_u64(7);
        let quiz = Quiz::generate(&words(4), &mut rng).unwrap();
        assert_eq!(quiz.len(), 4);
        for q in quiz.questions() {
            assert_eq!(q.options().len(), 4);
            assert!(q.options().iter().any(|o| o == q.correct_answer()));
            let n = q.word().trim_start_matches("word");
            assert_eq!(q.correct_answer(), format!("meaning{n}"));
        }
    }

    #[test]
    fn quiz_is_capped_at_five_questions() {
        let mut rng = StdRng::seed_from_u64(11);
        let quiz = Quiz::generate(&words(12), &mut rng).unwrap();
        assert_eq!(quiz.len(), MAX_QUIZ_QUESTIONS);
        let mut asked: Vec<&str> = quiz.questions().iter().map(QuizQuestion::word).collect();
        asked.sort_unstable();
        asked.dedup();
        assert_eq!(asked.len(), MAX_QUIZ_QUESTIONS);
    }

    #[test]
    fn duplicate_meanings_are_not_offered_twice() {
        let mut list = words(4);
        list[1].meaning = list[0].meaning.clone();
        let mut rng = StdRng::seed_from_u64(3);
        let quiz = Quiz::generate(&list, &mut rng).unwrap();
        for q in quiz.questions() {
            let mut options = q.options().to_vec();
            options.sort_unstable();
            options.dedup();
            assert_eq!(options.len(), q.options().len());
        }
    }

    #[test]
    fn answering_scores_and_guards() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut quiz = Quiz::generate(&words(5), &mut rng).unwrap();
        let right = quiz.questions()[0].correct_answer().to_owned();
        let wrong = quiz.questions()[1]
            .options()
            .iter()
            .find(|o| *o != quiz.questions()[1].correct_answer())
            .cloned()
            .unwrap();

        assert_eq!(quiz.answer(0, &right), Ok(true));
        assert_eq!(quiz.answer(0, &right), Err(QuizError::AlreadyAnswered(0)));
        assert_eq!(quiz.answer(1, &wrong), Ok(false));
        assert_eq!(
            quiz.answer(2, "not offered"),
            Err(QuizError::NotAnOption("not offered".into()))
        );
        assert_eq!(
            quiz.answer(9, &right),
            Err(QuizError::NoSuchQuestion { index: 9, len: 5 })
        );
        assert_eq!(quiz.score(), 1);
        assert!(!quiz.is_finished());
    }
}
