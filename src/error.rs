//! Error handling for the netvector engine
//!
//! Only configuration, target and reporting problems surface as errors.
//! Probe and share-enumeration failures are folded into their results and
//! never reach this type.

use thiserror::Error;

/// Main error type for discovery operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Resolution error: {0}")]
    ResolveError(String),

    #[error("Timeout error")]
    TimeoutError,

    #[error("Host task failed: {0}")]
    TaskError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Errors that only affect the host or target they came from
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidTarget(_)
                | ScanError::ResolveError(_)
                | ScanError::TimeoutError
                | ScanError::TaskError(_)
        )
    }
}

impl From<std::net::AddrParseError> for ScanError {
    fn from(e: std::net::AddrParseError) -> Self {
        ScanError::InvalidTarget(e.to_string())
    }
}

impl From<std::num::ParseIntError> for ScanError {
    fn from(e: std::num::ParseIntError) -> Self {
        ScanError::ParseError(e.to_string())
    }
}

impl From<ipnetwork::IpNetworkError> for ScanError {
    fn from(e: ipnetwork::IpNetworkError) -> Self {
        ScanError::InvalidTarget(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ScanError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ScanError::TimeoutError
    }
}

impl From<tokio::task::JoinError> for ScanError {
    fn from(e: tokio::task::JoinError) -> Self {
        ScanError::TaskError(e.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(e: toml::de::Error) -> Self {
        ScanError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(e: serde_json::Error) -> Self {
        ScanError::OutputError(e.to_string())
    }
}

impl From<csv::Error> for ScanError {
    fn from(e: csv::Error) -> Self {
        ScanError::OutputError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::InvalidTarget("300.300.300.300/24".to_string());
        assert_eq!(err.to_string(), "Invalid target: 300.300.300.300/24");
        assert_eq!(ScanError::TimeoutError.to_string(), "Timeout error");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ScanError::InvalidTarget("x".to_string()).is_recoverable());
        assert!(ScanError::TaskError("panic".to_string()).is_recoverable());
        assert!(!ScanError::ConfigError("bad".to_string()).is_recoverable());
        assert!(!ScanError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_conversions() {
        let addr_err = "not-an-ip".parse::<std::net::Ipv4Addr>().unwrap_err();
        assert!(matches!(ScanError::from(addr_err), ScanError::InvalidTarget(_)));

        let int_err = "70000".parse::<u16>().unwrap_err();
        assert!(matches!(ScanError::from(int_err), ScanError::ParseError(_)));
    }
}
