use thiserror::Error;

use crate::booking::SlotConflict;
use crate::contract::ValidationError;

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Terminal outcome of a failed API request.
///
/// `Display` is the message returned to clients for every variant except
/// [`ApiError::BackendUnavailable`], whose detail stays in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Table not found")]
    TableNotFound,
    #[error("Table is already reserved for the selected date and time")]
    SlotConflict,
    #[error("Table number already exists")]
    DuplicateTableNumber,
    #[error("User already exists")]
    UserExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Bad request syntax or unsupported method. Request path: {path}. HTTP method: {method}")]
    UnsupportedRoute { method: String, path: String },
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::BackendUnavailable(_) => 500,
            Self::Validation(_)
            | Self::TableNotFound
            | Self::SlotConflict
            | Self::DuplicateTableNumber
            | Self::UserExists
            | Self::InvalidCredentials
            | Self::UnsupportedRoute { .. } => 400,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::BackendUnavailable(_) => INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Stable snake_case label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::TableNotFound => "table_not_found",
            Self::SlotConflict => "slot_conflict",
            Self::DuplicateTableNumber => "duplicate_table_number",
            Self::UserExists => "user_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotFound(_) => "not_found",
            Self::UnsupportedRoute { .. } => "unsupported_route",
            Self::BackendUnavailable(_) => "backend_unavailable",
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.message().to_string())
    }
}

impl From<SlotConflict> for ApiError {
    fn from(_: SlotConflict) -> Self {
        Self::SlotConflict
    }
}
