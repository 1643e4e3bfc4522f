use crate::storage::StorageError;
use std::fmt;
use tonic::{Code, Status};

/// Error returned to RPC callers. Carries a status code and the message the
/// caller is allowed to see.
#[derive(Debug)]
pub struct AppError {
    pub code: Code,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific code and message.
    pub fn new(code: Code, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(Code::Internal, "Internal error")
    }

    pub fn not_found() -> Self {
        Self::new(Code::NotFound, "File not found")
    }

    pub fn cancelled() -> Self {
        Self::new(Code::Cancelled, "Call cancelled")
    }

    /// Map a failed storage operation onto what the caller sees.
    ///
    /// `action` names the operation for the server log, e.g. "uploading file".
    /// Missing files are not logged. Anything unexpected is logged with its
    /// cause and reaches the caller only as a bare internal error.
    pub fn from_storage(action: &str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => Self::not_found(),
            StorageError::Cancelled => {
                tracing::warn!("Cancelled while {}", action);
                Self::cancelled()
            }
            other => {
                tracing::error!("Error {}: {}", action, other);
                Self::internal()
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        Status::new(err.code, err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_found_keeps_its_own_code() {
        let status: Status =
            AppError::from_storage("downloading file", StorageError::NotFound("x".into())).into();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "File not found");
    }

    #[test]
    fn io_errors_are_masked_as_internal() {
        let err = StorageError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "secret path /srv/data",
        ));
        let status: Status = AppError::from_storage("uploading file", err).into();
        assert_eq!(status.code(), Code::Internal);
        assert!(!status.message().contains("/srv/data"));
    }

    #[test]
    fn invalid_keys_are_internal() {
        let status: Status =
            AppError::from_storage("deleting file", StorageError::InvalidKey("a/b".into())).into();
        assert_eq!(status.code(), Code::Internal);
    }

    #[test]
    fn cancellation_maps_to_cancelled() {
        let status: Status = AppError::from_storage("deleting file", StorageError::Cancelled).into();
        assert_eq!(status.code(), Code::Cancelled);
    }
}
