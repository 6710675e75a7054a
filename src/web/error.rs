//! API error handling for the file manager.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::file::FsError;

/// Hint appended when a non-forced delete hits a populated folder.
pub const NOT_EMPTY_HINT: &str = "Use force=true to delete a non-empty folder";

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Unauthorized (401).
    Unauthorized,
    /// Not found (404).
    NotFound,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error type. Rendered as a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Map a storage failure, prefixing its text with `context`.
    ///
    /// A target that is not a regular file is 404 and paths that cannot be
    /// stored are 400. Anything else, a missing target included, is a logged
    /// 500; handlers that answer 404 for a missing target use
    /// [`from_fs_lookup`](Self::from_fs_lookup).
    pub fn from_fs(context: &str, err: FsError) -> Self {
        let code = match &err {
            FsError::NotAFile { .. } => ErrorCode::NotFound,
            FsError::OutsideRoot { .. } | FsError::InvalidName { .. } => ErrorCode::BadRequest,
            FsError::NotFound { .. }
            | FsError::NotEmpty { .. }
            | FsError::PermissionDenied { .. }
            | FsError::Io { .. } => {
                tracing::error!(error = %err, "{}", context);
                ErrorCode::InternalError
            }
        };

        Self::new(code, format!("{context}: {err}"))
    }

    /// Like [`from_fs`](Self::from_fs), but a missing target is 404.
    pub fn from_fs_lookup(context: &str, err: FsError) -> Self {
        match err {
            FsError::NotFound { .. } => Self::not_found(format!("{context}: {err}")),
            err => Self::from_fs(context, err),
        }
    }

    /// Append an actionable hint to the message.
    pub fn with_hint(mut self, hint: &str) -> Self {
        self.message = format!("{}. {hint}", self.message);
        self
    }

    /// Error code of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status_code(), self.message).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
