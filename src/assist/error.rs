use thiserror::Error;

/// Ways a completion request can fail. None of this reaches the caller of
/// `/ai`; it is logged and replaced by a generic error.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("no API key configured for the completion service")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),
}
