use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::schemas::Envelope;

#[derive(Debug)]
pub(crate) enum ApiError {
    NotAuthenticated(Option<String>),
    Rejected(String),
    Validation(&'static str),
    BadRequest(String),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    NotFound(&'static str),
    TooManyRequests(&'static str),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated(_) | ApiError::Rejected(_) => StatusCode::OK,
            ApiError::Validation(_) | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> Option<String> {
        match self {
            ApiError::NotAuthenticated(message) => message,
            ApiError::Rejected(message)
            | ApiError::BadRequest(message)
            | ApiError::ServiceUnavailable(message)
            | ApiError::Internal(message) => Some(message),
            ApiError::Validation(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::TooManyRequests(message) => Some(message.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::ServiceUnavailable(message) => {
                tracing::error!(error = %message, "Service unavailable");
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
            }
            _ => {}
        }

        (status, Json(Envelope::failure(self.message()))).into_response()
    }
}
