//! Quiz sessions: one learner walking through a lesson's questions.
//!
//! A [`QuizSession`] borrows the authored questions and owns a
//! [`QuizCursor`], the only part that changes while the learner answers.
//! The cursor is plain data so it can be stored between requests and
//! resumed later against the same questions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::QuizQuestion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("a quiz needs at least one question")]
    EmptyQuiz,

    #[error("option {option} does not exist, the question has {options} options")]
    OptionOutOfRange { option: usize, options: usize },

    #[error("no answer has been selected for the current question")]
    NoAnswerSelected,

    #[error("the quiz is already completed")]
    AlreadyCompleted,

    #[error("saved quiz state does not match the quiz questions")]
    StaleCursor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizState {
    InProgress {
        index: usize,
        selected: Option<usize>,
    },
    /// The last question was answered with `selected` and the learner moved on.
    Completed { selected: usize },
}

impl Default for QuizState {
    fn default() -> Self {
        QuizState::InProgress {
            index: 0,
            selected: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCursor {
    pub state: QuizState,
    pub score: u32,
}

/// What the learner gets to see once an answer is locked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Feedback<'q> {
    pub correct: bool,
    pub correct_answer: usize,
    pub explanation: &'q str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(usize),
    Finished,
}

#[derive(Clone, Debug)]
pub struct QuizSession<'q> {
    questions: &'q [QuizQuestion],
    cursor: QuizCursor,
}

impl<'q> QuizSession<'q> {
    pub fn new(questions: &'q [QuizQuestion]) -> Result<QuizSession<'q>, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }

        Ok(QuizSession {
            questions,
            cursor: QuizCursor::default(),
        })
    }

    pub fn resume(
        questions: &'q [QuizQuestion],
        cursor: QuizCursor,
    ) -> Result<QuizSession<'q>, QuizError> {
        let session = QuizSession { questions, cursor };
        if questions.is_empty() || !session.cursor_fits() {
            return Err(QuizError::StaleCursor);
        }

        Ok(session)
    }

    fn cursor_fits(&self) -> bool {
        let index = self.current_index();
        let options = match self.questions.get(index) {
            None => return false,
            Some(question) => question.options.len(),
        };

        let selected_fits = self.selected_answer().map_or(true, |s| s < options);
        let answered = self.answered() as u32;

        selected_fits && self.cursor.score <= answered
    }

    pub fn cursor(&self) -> QuizCursor {
        self.cursor
    }

    pub fn state(&self) -> QuizState {
        self.cursor.state
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.cursor.score
    }

    /// Stays on the last question once the quiz is completed.
    pub fn current_index(&self) -> usize {
        match self.cursor.state {
            QuizState::InProgress { index, .. } => index,
            QuizState::Completed { .. } => self.questions.len() - 1,
        }
    }

    pub fn current_question(&self) -> &'q QuizQuestion {
        &self.questions[self.current_index()]
    }

    pub fn selected_answer(&self) -> Option<usize> {
        match self.cursor.state {
            QuizState::InProgress { selected, .. } => selected,
            QuizState::Completed { selected } => Some(selected),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.cursor.state, QuizState::Completed { .. })
    }

    /// Feedback for the current question, once it has been answered.
    pub fn feedback(&self) -> Option<Feedback<'q>> {
        let question = self.current_question();
        self.selected_answer().map(|selected| Feedback {
            correct: selected == question.correct_answer,
            correct_answer: question.correct_answer,
            explanation: &question.explanation,
        })
    }

    /// Locks in an answer for the current question.
    ///
    /// Returns `Ok(None)` when the question already has an answer: the first
    /// answer is final and later ones are ignored.
    pub fn select_answer(&mut self, option: usize) -> Result<Option<Feedback<'q>>, QuizError> {
        let options = self.current_question().options.len();
        if option >= options {
            return Err(QuizError::OptionOutOfRange { option, options });
        }

        match self.cursor.state {
            QuizState::InProgress {
                index,
                selected: None,
            } => {
                self.cursor.state = QuizState::InProgress {
                    index,
                    selected: Some(option),
                };
                if option == self.questions[index].correct_answer {
                    self.cursor.score += 1;
                }
                Ok(self.feedback())
            }
            _ => Ok(None),
        }
    }

    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        match self.cursor.state {
            QuizState::InProgress { selected: None, .. } => Err(QuizError::NoAnswerSelected),
            QuizState::InProgress {
                index,
                selected: Some(selected),
            } => {
                if index + 1 < self.questions.len() {
                    self.cursor.state = QuizState::InProgress {
                        index: index + 1,
                        selected: None,
                    };
                    Ok(Advance::NextQuestion(index + 1))
                } else {
                    self.cursor.state = QuizState::Completed { selected };
                    Ok(Advance::Finished)
                }
            }
            QuizState::Completed { .. } => Err(QuizError::AlreadyCompleted),
        }
    }

    pub fn retry(&mut self) {
        self.cursor = QuizCursor::default();
    }

    /// Number of questions answered so far, the current one included.
    pub fn answered(&self) -> usize {
        match self.cursor.state {
            QuizState::InProgress { index, selected } => index + selected.is_some() as usize,
            QuizState::Completed { .. } => self.questions.len(),
        }
    }

    /// Share of answered questions that were correct, 0 before the first answer.
    pub fn score_fraction(&self) -> f64 {
        match self.answered() {
            0 => 0.0,
            answered => f64::from(self.cursor.score) / answered as f64,
        }
    }

    /// Whole-percent score over the entire quiz, halves rounded up.
    pub fn percent_correct(&self) -> u32 {
        let total = self.questions.len() as u32;
        (200 * self.cursor.score + total) / (2 * total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<QuizQuestion> {
        (0..n)
            .map(|i| QuizQuestion {
                id: i as u32,
                question: format!("Question {}", i),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer: i % 3,
                explanation: format!("Because {}", i),
            })
            .collect()
    }

    fn initial() -> QuizCursor {
        QuizCursor {
            state: QuizState::InProgress {
                index: 0,
                selected: None,
            },
            score: 0,
        }
    }

    #[test]
    fn empty_quiz_is_rejected() {
        assert_eq!(QuizSession::new(&[]).unwrap_err(), QuizError::EmptyQuiz);
    }

    #[test]
    fn n_answers_and_advances_complete_the_quiz() {
        for n in 1..6 {
            let questions = questions(n);
            let mut session = QuizSession::new(&questions).unwrap();

            for i in 0..n {
                assert!(!session.is_complete());
                session.select_answer(0).unwrap();
                let step = session.advance().unwrap();
                if i + 1 < n {
                    assert_eq!(step, Advance::NextQuestion(i + 1));
                } else {
                    assert_eq!(step, Advance::Finished);
                }
            }

            assert!(session.is_complete());
            assert_eq!(session.current_index(), n - 1);
        }
    }

    #[test]
    fn score_counts_correct_answers_and_never_decreases() {
        let questions = questions(5);
        let mut session = QuizSession::new(&questions).unwrap();
        let picks = [0, 0, 2, 1, 1];
        let mut last_score = 0;

        for pick in picks.iter() {
            session.select_answer(*pick).unwrap();
            assert!(session.score() >= last_score);
            last_score = session.score();
            session.advance().unwrap();
        }

        let expected = picks
            .iter()
            .zip(questions.iter())
            .filter(|(pick, q)| **pick == q.correct_answer)
            .count() as u32;
        assert_eq!(session.score(), expected);
        assert!(session.score() <= 5);
    }

    #[test]
    fn second_selection_is_ignored() {
        let questions = questions(2);
        let mut session = QuizSession::new(&questions).unwrap();

        let feedback = session.select_answer(0).unwrap().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.explanation, "Because 0");

        assert_eq!(session.select_answer(1).unwrap(), None);
        assert_eq!(session.selected_answer(), Some(0));
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn out_of_range_option_leaves_state_untouched() {
        let questions = questions(2);
        let mut session = QuizSession::new(&questions).unwrap();

        let err = session.select_answer(3).unwrap_err();
        assert_eq!(
            err,
            QuizError::OptionOutOfRange {
                option: 3,
                options: 3
            }
        );
        assert_eq!(session.cursor(), initial());
    }

    #[test]
    fn advance_requires_an_answer() {
        let questions = questions(2);
        let mut session = QuizSession::new(&questions).unwrap();

        assert_eq!(session.advance().unwrap_err(), QuizError::NoAnswerSelected);
        assert_eq!(session.cursor(), initial());
    }

    #[test]
    fn completed_quiz_only_accepts_retry() {
        let questions = questions(1);
        let mut session = QuizSession::new(&questions).unwrap();
        session.select_answer(0).unwrap();
        session.advance().unwrap();
        let done = session.cursor();

        assert_eq!(session.advance().unwrap_err(), QuizError::AlreadyCompleted);
        assert_eq!(session.select_answer(1).unwrap(), None);
        assert_eq!(session.cursor(), done);

        session.retry();
        assert_eq!(session.cursor(), initial());
        assert!(!session.is_complete());
    }

    #[test]
    fn retry_resets_from_any_state() {
        let questions = questions(3);
        let mut session = QuizSession::new(&questions).unwrap();

        session.retry();
        assert_eq!(session.cursor(), initial());

        session.select_answer(0).unwrap();
        session.retry();
        assert_eq!(session.cursor(), initial());

        session.select_answer(0).unwrap();
        session.advance().unwrap();
        session.select_answer(1).unwrap();
        session.retry();
        assert_eq!(session.cursor(), initial());
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected_answer(), None);
    }

    #[test]
    fn two_of_four_correct() {
        let questions = questions(4);
        let mut session = QuizSession::new(&questions).unwrap();

        // correct answers are 0, 1, 2, 0
        for pick in [0, 2, 2, 1].iter() {
            session.select_answer(*pick).unwrap();
            session.advance().unwrap();
        }

        assert!(session.is_complete());
        assert_eq!(session.score(), 2);
        assert_eq!(session.score_fraction(), 0.5);
        assert_eq!(session.percent_correct(), 50);
    }

    #[test]
    fn score_fraction_tracks_answered_questions() {
        let questions = questions(3);
        let mut session = QuizSession::new(&questions).unwrap();
        assert_eq!(session.score_fraction(), 0.0);

        session.select_answer(0).unwrap();
        assert_eq!(session.answered(), 1);
        assert_eq!(session.score_fraction(), 1.0);

        session.advance().unwrap();
        assert_eq!(session.answered(), 1);
        session.select_answer(0).unwrap();
        assert_eq!(session.score_fraction(), 0.5);
    }

    #[test]
    fn percent_correct_rounds_halves_up() {
        let three = questions(3);
        let mut session = QuizSession::new(&three).unwrap();
        for pick in [0, 0, 2].iter() {
            session.select_answer(*pick).unwrap();
            session.advance().unwrap();
        }
        // 2 of 3
        assert_eq!(session.percent_correct(), 67);

        let eight = questions(8);
        let mut session = QuizSession::new(&eight).unwrap();
        session.select_answer(0).unwrap();
        // 1 of 8 is 12.5
        assert_eq!(session.percent_correct(), 13);
    }

    #[test]
    fn resume_continues_where_the_cursor_left_off() {
        let questions = questions(3);
        let mut session = QuizSession::new(&questions).unwrap();
        session.select_answer(0).unwrap();
        session.advance().unwrap();

        let mut resumed = QuizSession::resume(&questions, session.cursor()).unwrap();
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.score(), 1);
        resumed.select_answer(1).unwrap();
        assert_eq!(resumed.score(), 2);
    }

    #[test]
    fn resume_rejects_cursors_that_do_not_fit() {
        let questions = questions(2);

        let past_the_end = QuizCursor {
            state: QuizState::InProgress {
                index: 2,
                selected: None,
            },
            score: 0,
        };
        assert_eq!(
            QuizSession::resume(&questions, past_the_end).unwrap_err(),
            QuizError::StaleCursor
        );

        let bad_option = QuizCursor {
            state: QuizState::Completed { selected: 7 },
            score: 1,
        };
        assert_eq!(
            QuizSession::resume(&questions, bad_option).unwrap_err(),
            QuizError::StaleCursor
        );

        let inflated_score = QuizCursor {
            state: QuizState::InProgress {
                index: 0,
                selected: Some(0),
            },
            score: 2,
        };
        assert_eq!(
            QuizSession::resume(&questions, inflated_score).unwrap_err(),
            QuizError::StaleCursor
        );

        assert_eq!(
            QuizSession::resume(&[], QuizCursor::default()).unwrap_err(),
            QuizError::StaleCursor
        );
    }
}
