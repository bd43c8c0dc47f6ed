//! `OAuth2` provider endpoint configuration.

use crate::error::{Error, Result};
use url::Url;

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes requested when the flow does not override them.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is invalid.
    pub fn new(auth_url: impl AsRef<str>, token_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Validates that required URLs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.auth_url.has_host() {
            return Err(Error::InvalidConfig("auth_url has no host".into()));
        }
        if !self.token_url.has_host() {
            return Err(Error::InvalidConfig("token_url has no host".into()));
        }
        Ok(())
    }
}
