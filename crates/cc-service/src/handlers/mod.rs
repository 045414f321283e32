//! HTTP request handlers.

pub mod chat;
pub mod health;
pub mod meetings;
pub mod tenants;

use crate::errors::CcError;
use serde::de::DeserializeOwned;

/// Deserialize a JSON request body.
///
/// Bodies are taken as raw `Bytes` and parsed here so a malformed payload
/// becomes a 400 validation error in the standard envelope instead of the
/// framework's 422.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &axum::body::Bytes) -> Result<T, CcError> {
    serde_json::from_slice(body)
        .map_err(|e| CcError::Validation(format!("Invalid request body: {e}")))
}
