//! Error types for ftms-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use ftms_core::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use ftms_core::CoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e {
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::UnknownFilter { .. }
                | CoreError::InvalidFilter { .. }
                | CoreError::UnknownSortField { .. }
                | CoreError::InvalidPageSize { .. }
                | CoreError::NotSupported { .. } => StatusCode::BAD_REQUEST,
                CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::InvalidTransition { .. } | CoreError::Rejected { .. } => StatusCode::CONFLICT,
                CoreError::Network { .. } | CoreError::Decode { .. } => StatusCode::BAD_GATEWAY,
                CoreError::IoError { .. } | CoreError::ConfigError { .. } | CoreError::InternalError { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Core(e) => {
                DefaultErrorLogger.log_error(e, &ErrorContext::new("api request"));
                serde_json::to_value(e.to_details()).unwrap_or_default()
            }
            ApiError::NotFound { .. } => serde_json::json!({ "code": "NOT_FOUND", "message": self.to_string() }),
            ApiError::BadRequest { .. } => {
                log::warn!(target: "ftms::api", "{}", self);
                serde_json::json!({ "code": "BAD_REQUEST", "message": self.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Core(CoreError::from(error))
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ftms_core::validation::{FieldError, ValidationErrors};

    #[test]
    fn test_status_mapping() {
        let validation = ApiError::from(CoreError::Validation(ValidationErrors {
            errors: vec![FieldError::new("amount", "Amount is required")],
        }));
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let rejected = ApiError::from(CoreError::Rejected {
            status: 400,
            message: "Insufficient budget".to_string(),
        });
        assert_eq!(rejected.status(), StatusCode::CONFLICT);

        let network = ApiError::from(CoreError::Network { message: "timeout".to_string() });
        assert_eq!(network.status(), StatusCode::BAD_GATEWAY);

        let filter = ApiError::from(CoreError::UnknownFilter { key: "colour".to_string() });
        assert_eq!(filter.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transparent_message() {
        let err = ApiError::from(CoreError::UnknownSortField { field: "remarks".to_string() });
        assert_eq!(err.to_string(), "Field is not sortable: remarks");
    }
}
