//! Error types for ftms-core
//!
//! Covers the three failure families a list view can hit: malformed
//! list queries, local form validation, and backend failures (network
//! errors and business-rule rejections echoed by the backend).

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,
    /// Filter key not declared for the view
    UnknownFilter,
    /// Filter value does not match the declared kind
    InvalidFilter,
    /// Sort field not sortable for the view
    UnknownSortField,
    /// Page size of zero or above the limit
    InvalidPageSize,
    /// Form validation failed
    ValidationError,
    /// Status change not allowed
    InvalidTransition,
    /// Backend unreachable or failed
    NetworkError,
    /// Backend refused the request
    Rejected,
    /// Backend payload could not be decoded
    DecodeError,
    /// IO error
    IoError,
    /// Configuration error
    ConfigError,
    /// Operation not supported
    NotSupported,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::UnknownFilter => write!(f, "UNKNOWN_FILTER"),
            ErrorCode::InvalidFilter => write!(f, "INVALID_FILTER"),
            ErrorCode::UnknownSortField => write!(f, "UNKNOWN_SORT_FIELD"),
            ErrorCode::InvalidPageSize => write!(f, "INVALID_PAGE_SIZE"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InvalidTransition => write!(f, "INVALID_TRANSITION"),
            ErrorCode::NetworkError => write!(f, "NETWORK_ERROR"),
            ErrorCode::Rejected => write!(f, "REJECTED"),
            ErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
            ErrorCode::NotSupported => write!(f, "NOT_SUPPORTED"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
            retryable: false,
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Mark the error as retryable
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for ftms-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Unknown filter: {key}")]
    UnknownFilter { key: String },

    #[error("Invalid value for filter '{key}': {message}")]
    InvalidFilter { key: String, message: String },

    #[error("Field is not sortable: {field}")]
    UnknownSortField { field: String },

    #[error("Invalid page size: {size}")]
    InvalidPageSize { size: usize },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid payload: {message}")]
    Decode { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::UnknownFilter { .. } => ErrorCode::UnknownFilter,
            CoreError::InvalidFilter { .. } => ErrorCode::InvalidFilter,
            CoreError::UnknownSortField { .. } => ErrorCode::UnknownSortField,
            CoreError::InvalidPageSize { .. } => ErrorCode::InvalidPageSize,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::Network { .. } => ErrorCode::NetworkError,
            CoreError::Rejected { .. } => ErrorCode::Rejected,
            CoreError::Decode { .. } => ErrorCode::DecodeError,
            CoreError::IoError { .. } => ErrorCode::IoError,
            CoreError::ConfigError { .. } => ErrorCode::ConfigError,
            CoreError::NotSupported { .. } => ErrorCode::NotSupported,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::UnknownFilter { .. }
            | CoreError::InvalidFilter { .. }
            | CoreError::UnknownSortField { .. }
            | CoreError::InvalidPageSize { .. } => ErrorSeverity::Info,
            CoreError::Validation(_) => ErrorSeverity::Info,
            CoreError::InvalidTransition { .. } => ErrorSeverity::Warning,
            CoreError::Rejected { .. } => ErrorSeverity::Warning,
            CoreError::Network { .. } => ErrorSeverity::Error,
            CoreError::Decode { .. } => ErrorSeverity::Error,
            CoreError::IoError { .. } => ErrorSeverity::Error,
            CoreError::NotSupported { .. } => ErrorSeverity::Warning,
            CoreError::ConfigError { .. } => ErrorSeverity::Critical,
            CoreError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Network failures are surfaced with a retry action; nothing is retried automatically
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Network { .. } | CoreError::IoError { .. })
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::UnknownFilter { key } => {
                details = details.with_suggestion(format!(
                    "'{}' is not a filter of this view; check the list endpoint's documented parameters.",
                    key
                ));
            }
            CoreError::UnknownSortField { field } => {
                details = details.with_suggestion(format!(
                    "Sort by one of the view's columns instead of '{}'.",
                    field
                ));
            }
            CoreError::Validation(errors) => {
                details = details.with_detail(serde_json::json!({ "fields": errors.errors }));
                details = details
                    .with_suggestion("Correct the highlighted fields and submit again.".to_string());
            }
            CoreError::Rejected { message, .. } => {
                details = details.with_detail(serde_json::json!({ "backend_message": message }));
            }
            CoreError::Network { .. } | CoreError::IoError { .. } => {
                details = details
                    .with_suggestion("Check that the backend is reachable, then retry.".to_string());
            }
            CoreError::Decode { .. } => {
                details = details.with_suggestion(
                    "The backend returned data in an unexpected shape; check the API version."
                        .to_string(),
                );
            }
            CoreError::NotSupported { operation } => {
                details = details
                    .with_suggestion(format!("The operation '{}' is not available for this view.", operation));
            }
            _ => {}
        }

        if self.is_retryable() {
            details = details.retryable();
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Decode {
            message: error.to_string(),
        }
    }
}

impl From<ftms_config::ConfigError> for CoreError {
    fn from(error: ftms_config::ConfigError) -> Self {
        CoreError::ConfigError {
            message: error.to_string(),
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Request ID for tracing
    pub request_id: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: None,
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    /// Add request ID
    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Debug | ErrorSeverity::Info => log::info!(
                target: "ftms::error",
                "[{}] {} - Operation: {} - Data: {}",
                error.code(),
                error,
                context.operation,
                context.data
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "ftms::error",
                "[{}] {} - Operation: {} - Data: {}",
                error.code(),
                error,
                context.operation,
                context.data
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "ftms::error",
                "[{}] {} - Operation: {} - Request: {:?} - Data: {}",
                error.code(),
                error.to_details(),
                context.operation,
                context.request_id,
                context.data
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "ftms::error",
            "WARNING: {} - Operation: {} - Request: {:?}",
            message,
            context.operation,
            context.request_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::UnknownFilter.to_string(), "UNKNOWN_FILTER");
        assert_eq!(ErrorCode::NetworkError.to_string(), "NETWORK_ERROR");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::UnknownFilter { key: "colour".to_string() };
        assert_eq!(error.code(), ErrorCode::UnknownFilter);
        assert_eq!(error.severity(), ErrorSeverity::Info);

        let error = CoreError::Network { message: "connection refused".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert!(error.is_retryable());

        let error = CoreError::Rejected { status: 409, message: "insufficient budget".to_string() };
        assert!(!error.is_retryable());
        assert!(error.to_string().contains("insufficient budget"));
    }

    #[test]
    fn test_error_details_validation() {
        let errors = ValidationErrors {
            errors: vec![FieldError::new("amount", "Amount is required")],
        };
        let details = CoreError::Validation(errors).to_details();
        assert_eq!(details.code, ErrorCode::ValidationError);
        assert_eq!(details.details.unwrap()["fields"][0]["field"], "amount");
        assert!(!details.retryable);
    }

    #[test]
    fn test_error_details_network_is_retryable() {
        let details = CoreError::Network { message: "timeout".to_string() }.to_details();
        assert!(details.retryable);
        assert!(!details.suggestions.is_empty());
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("refresh")
            .with_request_id("req-123".to_string())
            .with_data("resource", serde_json::json!("revenues"));

        assert_eq!(context.operation, "refresh");
        assert_eq!(context.request_id, Some("req-123".to_string()));
        assert_eq!(context.data["resource"], "revenues");
    }

    #[test]
    fn test_io_error_conversion() {
        let error: CoreError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(error.code(), ErrorCode::IoError);
    }
}
