//! Error responses for the ticket API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use helpdesk_core::Forbidden;
use serde::Serialize;
use thiserror::Error;

/// Failure of an API request, rendered as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, missing or invalid input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Forbidden by ownership or claim rules.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Downstream failure. The message is generic; the cause is only logged.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Forbidden> for ApiError {
    fn from(reason: Forbidden) -> Self {
        ApiError::Forbidden(reason.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Failure of the unguarded lookup routes, rendered as `{ "error": ... }`
/// with status 500 whatever the cause.
#[derive(Debug)]
pub struct LookupError(pub String);

#[derive(Debug, Serialize)]
pub struct LookupErrorBody {
    pub error: String,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LookupErrorBody { error: self.0 }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_conversion_keeps_message() {
        let err = ApiError::from(Forbidden::NotClaimed);
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Nobody has claimed this ticket"));
    }

    #[tokio::test]
    async fn test_api_error_body_shape() {
        let response = ApiError::NotFound("Ticket not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "message": "Ticket not found" }));
    }

    #[tokio::test]
    async fn test_lookup_error_body_shape() {
        let response = LookupError("Database error: locked".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "error": "Database error: locked" }));
    }
}
