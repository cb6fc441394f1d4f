use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use vitrine_theme::Error as ThemeError;

/// An error ready to leave the process: a status code plus a reason string
/// that tells the uploader what to fix without describing scanner
/// internals.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ThemeError> for ApiError {
    fn from(err: ThemeError) -> Self {
        let status = match &err {
            ThemeError::NotFound { .. } => StatusCode::NOT_FOUND,
            ThemeError::Conflict { .. } => StatusCode::CONFLICT,
            ThemeError::Render(vitrine_render::Error::TemplateMissing { .. }) => {
                StatusCode::NOT_FOUND
            }
            // The uploaded archive or its template is at fault.
            _ if err.is_permanent_rejection() => StatusCode::BAD_REQUEST,
            ThemeError::Render(vitrine_render::Error::Render { .. }) => StatusCode::BAD_REQUEST,
            // Anything left is infrastructure: disk, registry, render I/O.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "theme pipeline failure");
            return Self::internal("internal error");
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
