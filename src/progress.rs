//! Which lessons a learner has certified by finishing their quiz.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::LessonId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LessonProgress {
    completed: BTreeSet<LessonId>,
}

impl LessonProgress {
    /// Returns `true` if the lesson was not already completed.
    pub fn mark_completed(&mut self, lesson_id: LessonId) -> bool {
        self.completed.insert(lesson_id)
    }

    pub fn is_completed(&self, lesson_id: LessonId) -> bool {
        self.completed.contains(&lesson_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn completed_ids(&self) -> impl Iterator<Item = LessonId> + '_ {
        self.completed.iter().copied()
    }

    /// Whole percent of `total_lessons` completed, rounded down. An empty
    /// course is 0% complete.
    pub fn percent_complete(&self, total_lessons: usize) -> u32 {
        if total_lessons == 0 {
            return 0;
        }

        (100 * self.completed.len() / total_lessons) as u32
    }
}
