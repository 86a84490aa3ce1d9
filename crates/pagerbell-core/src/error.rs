//! Unified error types for Pagerbell.

use thiserror::Error;

/// Result type alias using PagerbellError.
pub type Result<T> = std::result::Result<T, PagerbellError>;

#[derive(Error, Debug)]
pub enum PagerbellError {
    // State store errors
    #[error("State read error: {0}")]
    StorageRead(String),

    #[error("State write error: {0}")]
    StorageWrite(String),

    // Upstream schedule errors
    #[error("On-call query failed: {0}")]
    SourceQuery(String),

    // Notification errors
    #[error("Delivery failed: {0}")]
    Delivery(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PagerbellError {
    pub fn storage_read(msg: impl Into<String>) -> Self {
        Self::StorageRead(msg.into())
    }

    pub fn storage_write(msg: impl Into<String>) -> Self {
        Self::StorageWrite(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceQuery(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PagerbellError::SourceQuery("timeout".into());
        assert!(err.to_string().contains("timeout"));
        assert!(err.to_string().starts_with("On-call query failed"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(PagerbellError::storage_read("x"), PagerbellError::StorageRead(_)));
        assert!(matches!(PagerbellError::storage_write("x"), PagerbellError::StorageWrite(_)));
        assert!(matches!(PagerbellError::source("x"), PagerbellError::SourceQuery(_)));
        assert!(matches!(PagerbellError::delivery("x"), PagerbellError::Delivery(_)));
        assert!(matches!(PagerbellError::config("x"), PagerbellError::Config(_)));
    }
}
