//! Error types for the ONDC workbench

use thiserror::Error;

/// Result type alias using [`OndcError`]
pub type OndcResult<T> = std::result::Result<T, OndcError>;

/// ONDC workbench error types
#[derive(Error, Debug)]
pub enum OndcError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid form payload: {0}")]
    InvalidPayload(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OndcError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OndcError::config("missing base_url");
        assert_eq!(err.to_string(), "Configuration error: missing base_url");

        let err = OndcError::Http {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned HTTP 502: bad gateway");
    }

    #[test]
    fn test_is_transient() {
        assert!(OndcError::backend("connection reset").is_transient());
        assert!(OndcError::Http {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!OndcError::Http {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!OndcError::invalid_payload("bool").is_transient());
    }
}
