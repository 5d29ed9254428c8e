use reservation_core::contract::{Credentials, NewUser};
use reservation_core::error::ApiError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::UserExists => ApiError::UserExists,
            DirectoryError::InvalidCredentials => ApiError::InvalidCredentials,
            DirectoryError::Unavailable(message) => ApiError::BackendUnavailable(message),
        }
    }
}

pub trait UserDirectory: Send + Sync {
    fn sign_up(&self, user: &NewUser) -> Result<(), DirectoryError>;

    /// Returns the token clients present as their bearer credential.
    fn sign_in(&self, credentials: &Credentials) -> Result<String, DirectoryError>;
}
