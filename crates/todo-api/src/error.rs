use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::TodoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Todo not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// どのルートにも一致しない
    #[error("Resource not found")]
    RouteNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(error: TodoError) -> Self {
        match error {
            TodoError::Validation(_) | TodoError::Filter(_) => ApiError::BadRequest(error.to_string()),
            TodoError::NotFound(_) => ApiError::NotFound,
            TodoError::Conflict(_) => ApiError::Conflict(error.to_string()),
            TodoError::Store(message) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // ストアの詳細はログにのみ残す
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                tracing::warn!(status = status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
