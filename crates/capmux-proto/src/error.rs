//! Common error types for the capmux crates.

/// Convenience alias used throughout the capmux crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by capture orchestration and remote execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A build-time configuration problem, detected before any worker is
    /// spawned (empty parameter domain, empty capture-type list, malformed
    /// config file).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A capture-type name with no registered constructor.
    #[error("unknown capture type: {0}")]
    UnknownCaptureType(String),

    /// No usable credential material for a remote session.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// Transport-level failure executing a remote command.
    #[error("command channel error: {0}")]
    CommandChannel(String),

    /// A capture unit failed inside one of its lifecycle phases.
    #[error("capture error: {0}")]
    Capture(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfiguration`] with a formatted message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    /// Shorthand for an [`Error::Capture`] with a formatted message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Error::Capture(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = Error::invalid_config("parameter 'disk' has no candidate values");
        assert_eq!(
            err.to_string(),
            "invalid configuration: parameter 'disk' has no candidate values"
        );

        let err = Error::UnknownCaptureType("cpu-info".into());
        assert_eq!(err.to_string(), "unknown capture type: cpu-info");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
