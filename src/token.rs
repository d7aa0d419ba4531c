//! Learner state sealed into a bearer token.
//!
//! A token is `<state>.<signature>`: the bincode-encoded state and its
//! HMAC-SHA256 tag, both in unpadded URL-safe base64. Learners send it back
//! as `Authorization: UserState <token>`.

use ring::hmac;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const AUTHORIZATION_SCHEME: &str = "UserState";

const SEPARATOR: char = '.';

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("authorization header does not use the UserState scheme")]
    WrongScheme,

    #[error("token is not of the form <state>.<signature>")]
    Malformed,

    #[error("token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token signature does not match its state")]
    BadSignature,

    #[error("signed state could not be decoded: {0}")]
    UndecodableState(#[source] bincode::Error),

    #[error("state could not be encoded: {0}")]
    Unencodable(#[source] bincode::Error),
}

/// The token part of an `Authorization` header value.
pub fn from_authorization(header: &str) -> Result<&str, TokenError> {
    let header = header.trim();
    let (scheme, token) = match header.find(' ') {
        Some(split) => (&header[..split], header[split..].trim_start()),
        None => (header, ""),
    };

    if !scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME) {
        return Err(TokenError::WrongScheme);
    }
    if token.is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(token)
}

#[derive(Clone, Debug)]
pub struct TokenCodec {
    key: Arc<hmac::Key>,
}

impl TokenCodec {
    pub fn new(key: hmac::Key) -> TokenCodec {
        TokenCodec { key: Arc::new(key) }
    }

    pub fn seal<T: Serialize>(&self, state: &T) -> Result<String, TokenError> {
        let payload = bincode::serialize(state).map_err(TokenError::Unencodable)?;
        let tag = hmac::sign(&self.key, &payload);

        Ok(format!(
            "{}{}{}",
            base64::encode_config(&payload, base64::URL_SAFE_NO_PAD),
            SEPARATOR,
            base64::encode_config(tag.as_ref(), base64::URL_SAFE_NO_PAD),
        ))
    }

    /// Verifies the signature before anything in the payload is decoded.
    pub fn open<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let split = token.find(SEPARATOR).ok_or(TokenError::Malformed)?;
        let (payload, tag) = (&token[..split], &token[split + 1..]);
        if payload.is_empty() || tag.is_empty() {
            return Err(TokenError::Malformed);
        }

        let payload = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)?;
        let tag = base64::decode_config(tag, base64::URL_SAFE_NO_PAD)?;

        hmac::verify(&self.key, &payload, &tag).map_err(|_| TokenError::BadSignature)?;

        bincode::deserialize(&payload).map_err(TokenError::UndecodableState)
    }
}
