//! `OAuth2` token types.

use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default expiration buffer in seconds.
///
/// The buffer avoids races where a token expires between the check and its
/// use.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u32 = 60;

/// A persisted `OAuth2` token record.
///
/// Owned by the application; the library only reads and writes the file
/// representation the application designates (see [`crate::store`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    /// Access token string.
    pub access_token: String,
    /// Refresh token string (empty when the provider issued none).
    pub refresh_token: String,
    /// Token lifetime in seconds, counted from `issued_at`.
    pub expires_in: u32,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Builds a record from a token endpoint response, issued now.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.unwrap_or_default(),
            expires_in: response.expires_in.unwrap_or(0),
            issued_at: Utc::now(),
        }
    }

    /// Checks expiration with the default 60 second buffer.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(DEFAULT_EXPIRY_BUFFER_SECS)
    }

    /// True when `now >= issued_at + expires_in - buffer_secs`.
    ///
    /// The boundary is inclusive: a token exactly at the buffered deadline
    /// counts as expired. A buffer larger than the lifetime makes the record
    /// always expired.
    #[must_use]
    pub fn is_expired_with_buffer(&self, buffer_secs: u32) -> bool {
        let deadline =
            self.issued_at + Duration::seconds(i64::from(self.expires_in) - i64::from(buffer_secs));
        Utc::now() >= deadline
    }

    /// Returns the refresh token if the provider issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        if self.refresh_token.is_empty() {
            None
        } else {
            Some(&self.refresh_token)
        }
    }
}

/// Token response from an `OAuth2` token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted by the authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error response from an `OAuth2` server, delivered either in a redirect
/// query string or a non-2xx token endpoint body.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
    /// Optional URI with further information.
    #[serde(default)]
    pub error_uri: Option<String>,
    /// State echoed alongside a redirect-delivered error.
    #[serde(default)]
    pub state: Option<String>,
}

impl ErrorResponse {
    /// Converts to an [`Error::Provider`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::Provider {
            error: self.error,
            description: self.error_description,
            uri: self.error_uri,
            state: self.state,
        }
    }
}
