//! Error Types for the Marina API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct carrying a code and a client-facing message
//! - ErrorCode enum mapping each error category to an HTTP status
//! - IntoResponse rendering the `{"Error": "<message>"}` envelope
//!
//! Domain errors from `marina-core` convert into `ApiError` at the boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marina_core::{EntityKind, MarinaError, RelationshipError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    /// Caller is authenticated but does not own the boat
    NotOwner,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Conflict Errors (403)
    // ========================================================================
    /// Another boat already uses this name
    DuplicateName,

    /// Relationship transition is not legal from the current state
    RelationshipConflict,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    EntityNotFound,
    BoatNotFound,
    LoadNotFound,
    UserNotFound,

    /// The load is not on the given boat
    LoadNotOnBoat,

    // ========================================================================
    // Protocol Errors (405, 406, 415)
    // ========================================================================
    MethodNotAllowed,
    NotAcceptable,
    UnsupportedMediaType,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Store operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized
            | ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::NotOwner => StatusCode::UNAUTHORIZED,

            ErrorCode::ValidationFailed
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::DuplicateName | ErrorCode::RelationshipConflict => StatusCode::FORBIDDEN,

            ErrorCode::EntityNotFound
            | ErrorCode::BoatNotFound
            | ErrorCode::LoadNotFound
            | ErrorCode::UserNotFound
            | ErrorCode::LoadNotOnBoat => StatusCode::NOT_FOUND,

            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Missing or invalid bearer token",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::NotOwner => "The boat is owned by someone else",

            ErrorCode::ValidationFailed => {
                "The request object is missing at least one of the required attributes"
            }
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::DuplicateName => "A boat with this name already exists",
            ErrorCode::RelationshipConflict => {
                "The load is already loaded on a boat and must be unloaded before it can be loaded again"
            }

            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::BoatNotFound => "No boat with this boat_id exists",
            ErrorCode::LoadNotFound => "No load with this load_id exists",
            ErrorCode::UserNotFound => "No user with this user_id exists",
            ErrorCode::LoadNotOnBoat => {
                "No boat with this boat_id is loaded with the load with this load_id"
            }

            ErrorCode::MethodNotAllowed => "Method not allowed on this resource",
            ErrorCode::NotAcceptable => "Server only offers application/json",
            ErrorCode::UnsupportedMediaType => "Server only accepts application/json",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "The request could not be completed due to a storage failure",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    #[serde(rename = "Error")]
    pub error: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
        }
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn not_owner() -> Self {
        Self::from_code(ErrorCode::NotOwner)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' {}", field, reason),
        )
    }

    pub fn not_found(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Boat => Self::from_code(ErrorCode::BoatNotFound),
            EntityKind::Load => Self::from_code(ErrorCode::LoadNotFound),
            EntityKind::User => Self::from_code(ErrorCode::UserNotFound),
        }
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateName,
            format!("A boat named '{}' already exists", name),
        )
    }

    pub fn relationship_conflict() -> Self {
        Self::from_code(ErrorCode::RelationshipConflict)
    }

    pub fn load_not_on_boat() -> Self {
        Self::from_code(ErrorCode::LoadNotOnBoat)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(ErrorCode::MethodNotAllowed)
    }

    pub fn not_acceptable() -> Self {
        Self::from_code(ErrorCode::NotAcceptable)
    }

    pub fn unsupported_media_type() -> Self {
        Self::from_code(ErrorCode::UnsupportedMediaType)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error() -> Self {
        Self::from_code(ErrorCode::DatabaseError)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        // Full detail goes to the log, never to the client.
        tracing::error!(error = %err, "Store operation failed");
        ApiError::database_error()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::OutOfRange { field, min, max } => {
                ApiError::invalid_range(&field, min, max)
            }
            ValidationError::InvalidValue { field, reason } => {
                ApiError::invalid_format(&field, &reason)
            }
            ValidationError::EmptyUpdate => {
                ApiError::validation_failed("The request object does not contain any attribute to update")
            }
        }
    }
}

impl From<RelationshipError> for ApiError {
    fn from(err: RelationshipError) -> Self {
        match err {
            RelationshipError::AlreadyAssigned { .. } => ApiError::relationship_conflict(),
            RelationshipError::NotAssigned { .. } => ApiError::load_not_on_boat(),
        }
    }
}

impl From<MarinaError> for ApiError {
    fn from(err: MarinaError) -> Self {
        match err {
            MarinaError::Storage(e) => e.into(),
            MarinaError::Validation(e) => e.into(),
            MarinaError::Relationship(e) => e.into(),
            MarinaError::NotFound { kind, .. } => ApiError::not_found(kind),
            MarinaError::DuplicateName { name } => ApiError::duplicate_name(&name),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation_failed(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
