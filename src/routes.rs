use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::error;
use warp::{
    http::StatusCode,
    reject::{self, Rejection},
    reply::{self, Reply, Response},
    Filter,
};

use crate::assist::{Assistant, ChatMessage};
use crate::controllers::{LearningController, LessonError};
use crate::filters::{self, Unauthorized};
use crate::models::{CodeExample, Exercise, LessonId, UserState};
use crate::quiz::{Feedback, QuizError, QuizSession};

const JSON_BODY_LIMIT: u64 = 4 * 1024;
const AI_BODY_LIMIT: u64 = 64 * 1024;

#[derive(Clone, Debug, Serialize)]
struct LessonSummary<'a> {
    id: LessonId,
    title: &'a str,
    duration: &'a str,
    has_quiz: bool,
    completed: bool,
}

#[derive(Clone, Debug, Serialize)]
struct OutlineReply<'a> {
    lessons: Vec<LessonSummary<'a>>,
    progress: ProgressView,
    token: &'a str,
}

#[derive(Clone, Debug, Serialize)]
struct LessonReply<'a> {
    id: LessonId,
    title: &'a str,
    duration: &'a str,
    content: &'a str,
    code_examples: &'a [CodeExample],
    exercises: &'a [Exercise],
    has_quiz: bool,
}

#[derive(Clone, Debug, Serialize)]
struct QuestionView<'a> {
    id: u32,
    question: &'a str,
    options: &'a [String],
}

#[derive(Clone, Debug, Serialize)]
struct QuizReply<'a> {
    lesson_id: LessonId,
    index: usize,
    total: usize,
    question: QuestionView<'a>,
    selected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<Feedback<'a>>,
    score: u32,
    answered: usize,
    score_fraction: f64,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_correct: Option<u32>,
    token: &'a str,
}

impl<'a> QuizReply<'a> {
    fn new(lesson_id: LessonId, session: &QuizSession<'a>, token: &'a str) -> QuizReply<'a> {
        let question = session.current_question();

        QuizReply {
            lesson_id,
            index: session.current_index(),
            total: session.len(),
            question: QuestionView {
                id: question.id,
                question: &question.question,
                options: &question.options,
            },
            selected: session.selected_answer(),
            feedback: session.feedback(),
            score: session.score(),
            answered: session.answered(),
            score_fraction: session.score_fraction(),
            completed: session.is_complete(),
            percent_correct: if session.is_complete() {
                Some(session.percent_correct())
            } else {
                None
            },
            token,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct AnswerRequest {
    option: usize,
}

#[derive(Clone, Debug, Serialize)]
struct ProgressView {
    completed: Vec<LessonId>,
    completed_count: usize,
    total: usize,
    percent: u32,
}

impl ProgressView {
    fn new(controller: &LearningController, user_state: &UserState) -> ProgressView {
        ProgressView {
            completed: user_state.progress.completed_ids().collect(),
            completed_count: user_state.progress.completed_count(),
            total: controller.total_lessons(),
            percent: controller.percent_complete(user_state),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ProgressReply<'a> {
    #[serde(flatten)]
    progress: ProgressView,
    token: &'a str,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct AssistRequest {
    message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AssistReply {
    message: ChatMessage,
}

#[derive(Clone, Debug, Serialize)]
struct ErrorReply {
    error: ErrorCode,
}

#[derive(Clone, Copy, Debug, Serialize)]
enum ErrorCode {
    NotFound,
    Unauthorized,
    BadRequest,
    MethodNotAllowed,
    InvalidOption,
    NoAnswerSelected,
    QuizCompleted,
    #[serde(rename = "Internal Server Error")]
    Internal,
}

fn error_reply(error: ErrorCode, status: StatusCode) -> Response {
    reply::with_status(reply::json(&ErrorReply { error }), status).into_response()
}

fn internal_error(err: impl std::fmt::Display) -> Response {
    error!(error = %err, "request failed");
    error_reply(ErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR)
}

fn lesson_error(err: LessonError) -> Response {
    match err {
        LessonError::NotFound(_) | LessonError::NoQuiz(_) => {
            error_reply(ErrorCode::NotFound, StatusCode::NOT_FOUND)
        }
        LessonError::Quiz(QuizError::OptionOutOfRange { .. }) => {
            error_reply(ErrorCode::InvalidOption, StatusCode::BAD_REQUEST)
        }
        LessonError::Quiz(QuizError::NoAnswerSelected) => {
            error_reply(ErrorCode::NoAnswerSelected, StatusCode::BAD_REQUEST)
        }
        LessonError::Quiz(QuizError::AlreadyCompleted) => {
            error_reply(ErrorCode::QuizCompleted, StatusCode::BAD_REQUEST)
        }
        err @ LessonError::Quiz(_) => internal_error(err),
    }
}

/// Replies with the learner's quiz and their freshly signed state.
fn quiz_reply(
    lesson_id: LessonId,
    result: Result<QuizSession<'_>, LessonError>,
    user_state: &UserState,
    controller: &LearningController,
) -> Response {
    let session = match result {
        Ok(session) => session,
        Err(err) => return lesson_error(err),
    };

    match controller.encode_user(user_state) {
        Ok(token) => reply::json(&QuizReply::new(lesson_id, &session, &token)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub fn routes(
    controller: LearningController,
    assistant: Assistant,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let outline = warp::path!("lessons")
        .and(warp::get())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller.clone()))
        .map(|user_state: UserState, controller: LearningController| {
            let token = match controller.encode_user(&user_state) {
                Ok(token) => token,
                Err(err) => return internal_error(err),
            };

            let lessons = controller
                .lessons()
                .iter()
                .map(|lesson| LessonSummary {
                    id: lesson.id,
                    title: &lesson.title,
                    duration: &lesson.duration,
                    has_quiz: lesson.has_quiz(),
                    completed: user_state.progress.is_completed(lesson.id),
                })
                .collect();

            let reply = OutlineReply {
                lessons,
                progress: ProgressView::new(&controller, &user_state),
                token: &token,
            };

            reply::json(&reply).into_response()
        });

    let lesson = warp::path!("lessons" / LessonId)
        .and(warp::get())
        .and(filters::with_controller(controller.clone()))
        .map(
            |lesson_id: LessonId, controller: LearningController| match controller.lesson(lesson_id)
            {
                None => error_reply(ErrorCode::NotFound, StatusCode::NOT_FOUND),
                Some(lesson) => {
                    let reply = LessonReply {
                        id: lesson.id,
                        title: &lesson.title,
                        duration: &lesson.duration,
                        content: &lesson.content,
                        code_examples: &lesson.code_examples,
                        exercises: &lesson.exercises,
                        has_quiz: lesson.has_quiz(),
                    };

                    reply::json(&reply).into_response()
                }
            },
        );

    let get_quiz = warp::path!("lessons" / LessonId / "quiz")
        .and(warp::get())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller.clone()))
        .map(
            |lesson_id: LessonId, user_state: UserState, controller: LearningController| {
                let session = controller.quiz(lesson_id, &user_state);
                quiz_reply(lesson_id, session, &user_state, &controller)
            },
        );

    let post_answer = warp::path!("lessons" / LessonId / "quiz" / "answer")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller.clone()))
        .map(
            |lesson_id: LessonId,
             body: AnswerRequest,
             mut user_state: UserState,
             controller: LearningController| {
                let session = controller.select_answer(lesson_id, &mut user_state, body.option);
                quiz_reply(lesson_id, session, &user_state, &controller)
            },
        );

    let post_next = warp::path!("lessons" / LessonId / "quiz" / "next")
        .and(warp::post())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller.clone()))
        .map(
            |lesson_id: LessonId, mut user_state: UserState, controller: LearningController| {
                let session = controller.advance(lesson_id, &mut user_state);
                quiz_reply(lesson_id, session, &user_state, &controller)
            },
        );

    let post_retry = warp::path!("lessons" / LessonId / "quiz" / "retry")
        .and(warp::post())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller.clone()))
        .map(
            |lesson_id: LessonId, mut user_state: UserState, controller: LearningController| {
                let session = controller.retry(lesson_id, &mut user_state);
                quiz_reply(lesson_id, session, &user_state, &controller)
            },
        );

    let progress = warp::path!("progress")
        .and(warp::get())
        .and(filters::user_state(controller.clone()))
        .and(filters::with_controller(controller))
        .map(|user_state: UserState, controller: LearningController| {
            match controller.encode_user(&user_state) {
                Ok(token) => {
                    let reply = ProgressReply {
                        progress: ProgressView::new(&controller, &user_state),
                        token: &token,
                    };

                    reply::json(&reply).into_response()
                }
                Err(err) => internal_error(err),
            }
        });

    let ai = warp::path!("ai")
        .and(warp::post())
        .and(warp::body::content_length_limit(AI_BODY_LIMIT))
        .and(
            warp::body::json::<AssistRequest>()
                .or(warp::body::form::<AssistRequest>())
                .unify(),
        )
        .and(filters::with_assistant(assistant))
        .and_then(|body: AssistRequest, assistant: Assistant| async move {
            let reply = match assistant.reply(body.message).await {
                Ok(message) => reply::json(&AssistReply { message }).into_response(),
                Err(err) => {
                    error!(error = %err, "Error with completion request");
                    error_reply(ErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR)
                }
            };

            Ok::<_, Rejection>(reply)
        });

    outline
        .or(lesson)
        .or(get_quiz)
        .or(post_answer)
        .or(post_next)
        .or(post_retry)
        .or(progress)
        .or(ai)
        .recover(handle_rejection)
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let reply = if rejection.is_not_found() {
        error_reply(ErrorCode::NotFound, StatusCode::NOT_FOUND)
    } else if rejection.find::<Unauthorized>().is_some() {
        error_reply(ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED)
    } else if rejection
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        error_reply(ErrorCode::BadRequest, StatusCode::BAD_REQUEST)
    } else if rejection.find::<reject::PayloadTooLarge>().is_some() {
        error_reply(ErrorCode::BadRequest, StatusCode::PAYLOAD_TOO_LARGE)
    } else if rejection.find::<reject::UnsupportedMediaType>().is_some() {
        error_reply(ErrorCode::BadRequest, StatusCode::UNSUPPORTED_MEDIA_TYPE)
    } else if rejection.find::<reject::LengthRequired>().is_some() {
        error_reply(ErrorCode::BadRequest, StatusCode::LENGTH_REQUIRED)
    } else if rejection.find::<reject::MethodNotAllowed>().is_some() {
        error_reply(ErrorCode::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED)
    } else {
        internal_error(format!("unhandled rejection: {:?}", rejection))
    };

    Ok(reply)
}
