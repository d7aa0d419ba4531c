use rand::Rng;
use ring::hmac;
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Catalogue, Lesson, LessonId, UserId, UserState};
use crate::progress::LessonProgress;
use crate::quiz::{Advance, QuizError, QuizSession};
use crate::token::{TokenCodec, TokenError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LessonError {
    #[error("lesson {0} not found")]
    NotFound(LessonId),

    #[error("lesson {0} has no quiz")]
    NoQuiz(LessonId),

    #[error(transparent)]
    Quiz(#[from] QuizError),
}

#[derive(Clone, Debug)]
pub struct LearningController {
    tokens: TokenCodec,
    lessons: Arc<Vec<Lesson>>,
    positions: Arc<BTreeMap<LessonId, usize>>,
}

impl LearningController {
    pub fn new(secret_key: hmac::Key, catalogue: Catalogue) -> LearningController {
        let positions = catalogue
            .lessons
            .iter()
            .enumerate()
            .map(|(position, lesson)| (lesson.id, position))
            .collect();

        LearningController {
            tokens: TokenCodec::new(secret_key),
            lessons: Arc::new(catalogue.lessons),
            positions: Arc::new(positions),
        }
    }

    /// A learner who has not opened any lesson yet.
    pub fn create_user(&self) -> UserState {
        let mut id = [0u8; 16];
        rand::rngs::OsRng.fill(&mut id[..]);

        UserState {
            id: UserId(id),
            progress: LessonProgress::default(),
            quizzes: BTreeMap::new(),
        }
    }

    /// The learner carried by a token, once its signature checks out.
    pub fn decode_user(&self, token: &str) -> Result<UserState, TokenError> {
        self.tokens.open(token)
    }

    pub fn encode_user(&self, user_state: &UserState) -> Result<String, TokenError> {
        self.tokens.seal(user_state)
    }

    /// All lessons, in course order.
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, lesson_id: LessonId) -> Option<&Lesson> {
        self.positions
            .get(&lesson_id)
            .map(|&position| &self.lessons[position])
    }

    pub fn total_lessons(&self) -> usize {
        self.lessons.len()
    }

    /// The learner's session for a lesson quiz, fresh if they never opened it.
    pub fn quiz<'a>(
        &'a self,
        lesson_id: LessonId,
        user_state: &UserState,
    ) -> Result<QuizSession<'a>, LessonError> {
        let lesson = self
            .lesson(lesson_id)
            .ok_or(LessonError::NotFound(lesson_id))?;
        if !lesson.has_quiz() {
            return Err(LessonError::NoQuiz(lesson_id));
        }

        match user_state.quizzes.get(&lesson_id) {
            None => Ok(QuizSession::new(&lesson.quiz)?),
            Some(cursor) => match QuizSession::resume(&lesson.quiz, *cursor) {
                Ok(session) => Ok(session),
                Err(err) => {
                    debug!(lesson_id, %err, "restarting quiz");
                    Ok(QuizSession::new(&lesson.quiz)?)
                }
            },
        }
    }

    pub fn select_answer<'a>(
        &'a self,
        lesson_id: LessonId,
        user_state: &mut UserState,
        option: usize,
    ) -> Result<QuizSession<'a>, LessonError> {
        let mut session = self.quiz(lesson_id, user_state)?;
        session.select_answer(option)?;

        user_state.quizzes.insert(lesson_id, session.cursor());
        Ok(session)
    }

    /// Moves to the next question. Finishing the quiz certifies the lesson.
    pub fn advance<'a>(
        &'a self,
        lesson_id: LessonId,
        user_state: &mut UserState,
    ) -> Result<QuizSession<'a>, LessonError> {
        let mut session = self.quiz(lesson_id, user_state)?;

        if session.advance()? == Advance::Finished
            && user_state.progress.mark_completed(lesson_id)
        {
            info!(
                lesson_id,
                score = session.score(),
                total = session.len(),
                "lesson completed"
            );
        }

        user_state.quizzes.insert(lesson_id, session.cursor());
        Ok(session)
    }

    pub fn retry<'a>(
        &'a self,
        lesson_id: LessonId,
        user_state: &mut UserState,
    ) -> Result<QuizSession<'a>, LessonError> {
        let mut session = self.quiz(lesson_id, user_state)?;
        session.retry();

        user_state.quizzes.insert(lesson_id, session.cursor());
        Ok(session)
    }

    pub fn percent_complete(&self, user_state: &UserState) -> u32 {
        user_state.progress.percent_complete(self.total_lessons())
    }
}

#[cfg(test)]
pub(crate) fn test_controller() -> LearningController {
    let secret_key = hmac::Key::new(hmac::HMAC_SHA256, &[7u8; 32]);
    let catalogue = Catalogue::from_toml(crate::models::TEST_CATALOGUE).unwrap();
    LearningController::new(secret_key, catalogue)
}
