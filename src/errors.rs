use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Validation failures carry their human-readable error text through to the
/// caller; every other variant maps to a fixed generic phrase so internal
/// details never leak into a response body.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed request body (undecodable JSON).
    BadRequest(String),
    /// Authentication failure. Not an exceptional state, just an outcome.
    Forbidden,
    /// Unknown method name.
    NotFound(String),
    /// Envelope or argument schema validation failure, joined error text.
    InvalidRequest(String),
    /// Unexpected failure inside a handler.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl AppError {
    /// Status code of the response this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response envelope.
    ///
    /// Only validation errors expose their message; the rest use the fixed
    /// phrase for their status code.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => msg.clone(),
            other => generic_phrase(other.status_code()).to_string(),
        }
    }
}

/// Fixed user-visible phrase for a non-validation status code.
pub fn generic_phrase(code: StatusCode) -> &'static str {
    match code {
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::UNPROCESSABLE_ENTITY => "Invalid Request",
        _ => "Internal Server Error",
    }
}

impl IntoResponse for AppError {
    /// Converts the error into the JSON response envelope
    /// `{"error": <text>, "code": <code>}` with a mirroring HTTP status.
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
            }
            AppError::Forbidden => {
                tracing::warn!("Authentication failed");
            }
            AppError::NotFound(method) => {
                tracing::warn!("Unknown method: {}", method);
            }
            AppError::InvalidRequest(msg) => {
                tracing::info!("Validation failed: {}", msg);
            }
        }

        let status = self.status_code();
        let body = Json(json!({
            "error": self.public_message(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
