use std::future::Future;

use reservation_core::error::ApiError;
use thiserror::Error;

pub mod cognito;
pub mod dynamodb;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod reservation_store;
pub mod table_store;
pub mod user_directory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored item is malformed: {0}")]
    Malformed(String),
    /// The slot ledger moved between snapshot and insert.
    #[error("slot ledger version changed concurrently")]
    Contended,
    #[error("item already exists")]
    AlreadyExists,
    #[error("table number {0} is already taken")]
    NumberTaken(u32),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::BackendUnavailable(error.to_string())
    }
}

/// Drives an SDK future to completion from a synchronous adapter method.
///
/// Requires the multi-thread Tokio runtime the Lambda binaries start.
pub(crate) fn run_blocking<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
