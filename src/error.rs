//! Error types for the wallet session

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The provider did not return a session. Displays the bare message so it
    /// can be shown to the user as-is.
    #[error("{0}")]
    ConnectionFailure(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failure_displays_bare_message() {
        let err = Error::ConnectionFailure("rejected".to_string());
        assert_eq!(err.to_string(), "rejected");
    }

    #[test]
    fn test_config_error_is_prefixed() {
        let err = Error::Config("bad network".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad network");
    }
}
