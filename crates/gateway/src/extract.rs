//! Request extractors

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use linkrank_common::errors::AppError;
use serde::de::DeserializeOwned;

/// JSON body that falls back to `T::default()` when the body is empty.
///
/// Malformed bodies are rejected as validation errors rather than axum's
/// plain-text rejection, so clients always get the JSON error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidFormat {
                message: e.body_text(),
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::Validation {
                message: format!("Invalid JSON body: {}", e),
                field: None,
            })
    }
}
