//! Error types for `OAuth2` operations.

use std::io;
use std::path::PathBuf;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
///
/// Every failure the library reports is one of these variants; there are no
/// implicit retries anywhere. `Timeout` and `Transport` are sensible to retry
/// with a fresh flow, `StateMismatch` and `Provider` are hard aborts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Callback listener could not bind its local port.
    #[error("failed to bind callback listener on port {port}: {source}")]
    Bind {
        /// Requested local port.
        port: u16,
        /// Underlying bind failure.
        source: io::Error,
    },

    /// No callback arrived within the deadline.
    #[error("no authorization callback within {0} seconds")]
    Timeout(u64),

    /// The authorization attempt was cancelled by the caller.
    #[error("authorization cancelled")]
    Cancelled,

    /// The `state` echoed in the redirect does not match the one generated
    /// for this attempt. Potential CSRF; never silently ignored.
    #[error("state parameter mismatch in authorization callback")]
    StateMismatch,

    /// Explicit `OAuth2` error from the authorization server or token
    /// endpoint, surfaced verbatim.
    #[error("OAuth2 error: {error} - {description}")]
    Provider {
        /// Error code (e.g., `invalid_grant`, `access_denied`).
        error: String,
        /// Human-readable description.
        description: String,
        /// Optional URI with further information.
        uri: Option<String>,
        /// State echoed alongside a redirect-delivered error.
        state: Option<String>,
    },

    /// Network-level failure during a token endpoint exchange.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Malformed callback query string.
    #[error("malformed authorization callback: {0}")]
    RedirectParse(String),

    /// Token file does not exist.
    #[error("token file not found: {0}")]
    TokenFileNotFound(PathBuf),

    /// Token file content is not a valid record.
    #[error("token file {path} is not a valid record: {source}")]
    TokenFileParse {
        /// Offending file path.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },

    /// Token endpoint returned a body that is neither a token nor an
    /// `OAuth2` error payload.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to hand the authorization URL to the system browser.
    #[error("failed to open browser: {0}")]
    Browser(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Returns true for outcomes worth retrying with a fresh flow.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout(300).is_retryable());
        assert!(!Error::StateMismatch.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_timeout_display_carries_seconds() {
        assert_eq!(
            Error::Timeout(300).to_string(),
            "no authorization callback within 300 seconds"
        );
    }
}
