use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::progress::LessonProgress;
use crate::quiz::QuizCursor;

pub type LessonId = u32;

/// The lesson catalogue, as authored in `lessons.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct Catalogue {
    #[serde(default, rename = "lesson")]
    pub lessons: Vec<Lesson>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub duration: String,
    pub content: String,

    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,

    #[serde(default, rename = "code_example")]
    pub code_examples: Vec<CodeExample>,

    #[serde(default, rename = "exercise")]
    pub exercises: Vec<Exercise>,
}

impl Lesson {
    pub fn has_quiz(&self) -> bool {
        !self.quiz.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CodeExample {
    pub title: String,
    pub language: String,
    pub code: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Exercise {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub code: String,
    pub solution: String,
}

impl Catalogue {
    pub fn from_toml(source: &str) -> Result<Catalogue> {
        let catalogue: Catalogue = toml::de::from_str(source)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Checks the authoring rules every quiz relies on at runtime.
    pub fn validate(&self) -> Result<()> {
        let mut lesson_ids = BTreeSet::new();

        for lesson in &self.lessons {
            if !lesson_ids.insert(lesson.id) {
                bail!("duplicate lesson id {}", lesson.id);
            }

            let mut question_ids = BTreeSet::new();
            for question in &lesson.quiz {
                ensure!(
                    question_ids.insert(question.id),
                    "lesson {}: duplicate question id {}",
                    lesson.id,
                    question.id
                );
                ensure!(
                    question.options.len() >= 2,
                    "lesson {}, question {}: needs at least two options",
                    lesson.id,
                    question.id
                );
                ensure!(
                    question.correct_answer < question.options.len(),
                    "lesson {}, question {}: correct answer {} is not one of {} options",
                    lesson.id,
                    question.id,
                    question.correct_answer,
                    question.options.len()
                );
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserId(pub [u8; 16]);

/// Everything the server knows about a learner. It only ever lives inside
/// the signed token the learner carries.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserState {
    pub id: UserId,
    pub progress: LessonProgress,
    pub quizzes: BTreeMap<LessonId, QuizCursor>,
}

#[cfg(test)]
pub(crate) const TEST_CATALOGUE: &str = r##"
[[lesson]]
id = 1
title = "Variables and scoping"
duration = "25 min"
content = "# Variables\n\nUse `const` by default."

[[lesson.quiz]]
id = 1
question = "Which keyword declares a block-scoped constant?"
options = ["var", "let", "const"]
correct_answer = 2
explanation = "`const` is block scoped and cannot be reassigned."

[[lesson.quiz]]
id = 2
question = "Is `var` block scoped?"
options = ["Yes", "No"]
correct_answer = 1
explanation = "`var` is function scoped."

[[lesson.code_example]]
title = "Block scope"
language = "javascript"
code = "let points = 100;"

[[lesson.exercise]]
id = 1
title = "Fix the reassignment"
description = "Make the counter reassignable."
code = "const count = 0; count = 1;"
solution = "let count = 0; count = 1;"

[[lesson]]
id = 2
title = "Arrow functions"
duration = "20 min"
content = "# Arrow functions"

[[lesson.quiz]]
id = 1
question = "Do arrow functions bind their own `this`?"
options = ["Yes", "No"]
correct_answer = 1
explanation = "Arrow functions capture `this` from the enclosing scope."

[[lesson]]
id = 3
title = "Template literals"
duration = "15 min"
content = "# Template literals"
"##;
