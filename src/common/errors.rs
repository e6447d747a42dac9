use lambda_http::{Error as LambdaError, Response};
use thiserror::Error as ThisError;

/// Failure kinds surfaced by [`NoteStore`](crate::common::note_store::NoteStore).
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum NoteStoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("note not found: {0}")]
    NotFound(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl NoteStoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            NoteStoreError::InvalidInput(_) => "InvalidInput",
            NoteStoreError::NotFound(_) => "NotFound",
            NoteStoreError::StorageUnavailable(_) => "StorageUnavailable",
        }
    }
}

/// Handler outcome that is not a success response.
///
/// `HttpError` carries a complete response for the caller, `LambdaError` is
/// handed back to the runtime as an invocation failure.
#[derive(Debug)]
pub enum Error {
    HttpError(Response<String>),
    LambdaError(LambdaError),
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Error::LambdaError(Box::new(err))
    }
}
