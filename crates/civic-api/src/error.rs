//! Error responses and startup failures
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use civic_core::CivicError;
use civic_service::ClassifierError;
use serde_json::json;
use thiserror::Error;

/// A [`CivicError`] on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CivicError);

impl From<CivicError> for ApiError {
    fn from(err: CivicError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &CivicError) -> StatusCode {
    match err {
        CivicError::Validation(_) | CivicError::InvalidState(_) => StatusCode::BAD_REQUEST,
        CivicError::Authentication(_) => StatusCode::UNAUTHORIZED,
        CivicError::Authorization(_) => StatusCode::FORBIDDEN,
        CivicError::NotFound(_) => StatusCode::NOT_FOUND,
        CivicError::Conflict(_) => StatusCode::CONFLICT,
        CivicError::Classifier(_) | CivicError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "request rejected");
        }
        (status, Json(json!({ "message": self.0.message() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Anything that stops the server from starting
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Civic(#[from] CivicError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CivicError::validation("x"), 400),
            (CivicError::Authentication("x".into()), 401),
            (CivicError::Authorization("x".into()), 403),
            (CivicError::not_found("x"), 404),
            (CivicError::InvalidState("x".into()), 400),
            (CivicError::Conflict("x".into()), 409),
            (CivicError::Classifier("x".into()), 503),
            (CivicError::Persistence("x".into()), 503),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err).as_u16(), status, "{err}");
        }
    }
}
