use std::convert::Infallible;
use tracing::debug;
use warp::{
    reject::{self, Reject},
    Filter, Rejection,
};

use crate::assist::Assistant;
use crate::controllers::LearningController;
use crate::models::UserState;
use crate::token::{self, TokenError};

/// A learner token that was present but could not be trusted.
#[derive(Debug)]
pub struct Unauthorized(pub TokenError);

impl Reject for Unauthorized {}

pub fn with_controller(
    controller: LearningController,
) -> impl Filter<Extract = (LearningController,), Error = Infallible> + Clone {
    warp::any().map(move || controller.clone())
}

pub fn with_assistant(
    assistant: Assistant,
) -> impl Filter<Extract = (Assistant,), Error = Infallible> + Clone {
    warp::any().map(move || assistant.clone())
}

fn authorize(controller: &LearningController, header: &str) -> Result<UserState, TokenError> {
    let token = token::from_authorization(header)?;
    controller.decode_user(token)
}

/// The learner behind the request. Without an `Authorization` header this is
/// a new learner.
pub fn user_state(
    controller: LearningController,
) -> impl Filter<Extract = (UserState,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_controller(controller))
        .and_then(
            |header: Option<String>, controller: LearningController| async move {
                let header = match header {
                    None => return Ok(controller.create_user()),
                    Some(header) => header,
                };

                authorize(&controller, &header).map_err(|err| {
                    debug!(reason = ?err, "rejected learner token: {}", err);
                    reject::custom(Unauthorized(err))
                })
            },
        )
}
