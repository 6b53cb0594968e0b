//! Admin authentication.
//!
//! Routes that drive the notification queue or accept save events take an
//! [`AdminKey`] extractor, which checks the `X-API-Key` header against the
//! configured `ADMIN_API_KEY`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use postbell_common::error::AppError;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the admin API key.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

/// Compare without short-circuiting on the first differing byte.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

impl FromRequestParts<AppState> for AdminKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Auth("Missing X-API-Key header".to_string()))?;

        let expected = state.config.admin_api_key.as_bytes();
        if expected.is_empty() || !keys_match(presented.as_bytes(), expected) {
            return Err(AppError::Auth("Invalid API key".to_string()));
        }

        Ok(AdminKey)
    }
}
