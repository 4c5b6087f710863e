//! HTTP error responses: every failure is `{"error": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use engine::EngineError;

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// 404 for a missing `entity`, e.g. `Workflow not found`.
    pub fn not_found(entity: &str) -> Self {
        let mut chars = entity.chars();
        let entity = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self {
            error: format!("{entity} not found"),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn internal() -> Self {
        Self {
            error: "Internal server error".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => Self::bad_request(message),
            EngineError::NotFound { entity, .. } => Self::not_found(entity),
            EngineError::InvalidTransition { .. } => {
                error!("run lifecycle violated: {err}");
                Self::internal()
            }
            EngineError::Aborted { .. } | EngineError::Database(_) => {
                error!("request failed: {err}");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
