//! Lesson quizzes, learner progress and an error-explanation assistant for
//! an interactive JavaScript course, served over HTTP.

pub mod assist;
pub mod config;
pub mod controllers;
pub mod filters;
pub mod models;
pub mod progress;
pub mod quiz;
pub mod routes;
pub mod token;

pub use controllers::LearningController;
pub use models::{Catalogue, Lesson, QuizQuestion};
pub use progress::LessonProgress;
pub use quiz::{QuizError, QuizSession};
