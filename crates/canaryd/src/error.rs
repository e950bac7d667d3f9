//! API error type and the error → HTTP status mapping.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canary_core::{ErrorKind, JudgeError};
use concourse_bridge::BridgeError;
use serde_json::json;

/// Error returned by every handler, rendered as
/// `{"error": {"code", "message", "status"}}`.
#[derive(Debug)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code,
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message, StatusCode::BAD_REQUEST)
    }
}

impl From<JudgeError> for ApiError {
    fn from(err: JudgeError) -> Self {
        let (code, status) = match (&err, err.kind()) {
            (JudgeError::NoJudgesRegistered, _) => {
                ("NO_JUDGES_REGISTERED", StatusCode::SERVICE_UNAVAILABLE)
            }
            (_, ErrorKind::NotFound) => ("NOT_FOUND", StatusCode::NOT_FOUND),
            (_, ErrorKind::InvalidArgument) => ("INVALID_ARGUMENT", StatusCode::BAD_REQUEST),
            (_, ErrorKind::Unavailable) => ("UNAVAILABLE", StatusCode::SERVICE_UNAVAILABLE),
            (_, ErrorKind::Upstream) => ("INTERNAL", StatusCode::INTERNAL_SERVER_ERROR),
        };
        Self::new(code, err.to_string(), status)
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let (code, status) = match &err {
            BridgeError::NotConfigured { .. } => ("NOT_CONFIGURED", StatusCode::SERVICE_UNAVAILABLE),
            BridgeError::InvalidUrl { .. } => ("INTERNAL", StatusCode::INTERNAL_SERVER_ERROR),
            BridgeError::Upstream { .. } => ("UPSTREAM_ERROR", StatusCode::BAD_GATEWAY),
            BridgeError::Transport { .. } | BridgeError::Decode { .. } => {
                ("UPSTREAM_UNAVAILABLE", StatusCode::BAD_GATEWAY)
            }
        };
        Self::new(code, err.to_string(), status)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = self.code, status = self.status.as_u16(), message = %self.message, "Request failed");
        }
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "status": self.status.as_u16(),
            }
        });
        (self.status, Json(body)).into_response()
    }
}
