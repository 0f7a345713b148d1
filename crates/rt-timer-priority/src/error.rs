//! Error types for priority elevation.

use thiserror::Error;

/// Why the process priority could not be changed.
#[derive(Debug, Error)]
pub enum PriorityError {
    /// The OS rejected the request, typically for lack of privileges.
    #[error("OS rejected priority change: {0}")]
    Os(#[source] std::io::Error),

    /// This platform has no supported priority mechanism.
    #[error("process priority is not supported on this platform")]
    Unsupported,
}

/// Result alias for priority operations.
pub type PriorityResult<T = ()> = Result<T, PriorityError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_display_includes_os_reason() {
        let err = PriorityError::Os(io::Error::from(io::ErrorKind::PermissionDenied));
        let message = err.to_string();
        assert!(message.starts_with("OS rejected priority change"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unsupported_has_no_source() {
        assert!(std::error::Error::source(&PriorityError::Unsupported).is_none());
    }
}
