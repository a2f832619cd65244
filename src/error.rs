use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Everything the URL service can reject a request with, plus the two
/// resolution failures surfaced by the redirect path.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid shortcode format: {0}")]
    InvalidShortcodeFormat(String),

    #[error("shortcode already exists: {0}")]
    ShortcodeCollision(String),

    #[error("invalid validity minutes: {0}")]
    InvalidValidity(i64),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("could not generate a unique shortcode")]
    GenerationExhausted,

    #[error("maximum {max} URLs can be shortened at once (got {got})")]
    BatchTooLarge { got: usize, max: usize },

    #[error("shortcode not found: {0}")]
    NotFound(String),

    #[error("short URL has expired: {0}")]
    Expired(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidUrl(_)
            | ServiceError::InvalidShortcodeFormat(_)
            | ServiceError::InvalidValidity(_)
            | ServiceError::InvalidBody(_)
            | ServiceError::BatchTooLarge { .. } => StatusCode::BAD_REQUEST,
            ServiceError::ShortcodeCollision(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Expired(_) => StatusCode::GONE,
            ServiceError::GenerationExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal failures get a generic body; the detail is only logged.
        let message = if status.is_server_error() {
            tracing::error!("internal error while processing request: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        for err in [
            ServiceError::InvalidUrl("not-a-url".into()),
            ServiceError::InvalidShortcodeFormat("ab".into()),
            ServiceError::InvalidValidity(0),
            ServiceError::InvalidBody("expected an integer".into()),
            ServiceError::BatchTooLarge { got: 6, max: 5 },
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn resolution_and_conflict_statuses() {
        assert_eq!(
            ServiceError::ShortcodeCollision("test1".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::NotFound("test1".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Expired("test1".into()).status(),
            StatusCode::GONE
        );
        assert_eq!(
            ServiceError::GenerationExhausted.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
