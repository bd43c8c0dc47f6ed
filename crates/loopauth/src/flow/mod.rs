//! `OAuth2` authorization flow components.

mod authorize;
mod code;
mod listener;
mod pkce;

pub use authorize::AuthorizationUrl;
pub use code::{AuthorizationCodeFlow, DEFAULT_CALLBACK_TIMEOUT, UrlOpener, open_in_browser};
pub use listener::{
    AuthorizationResponse, CallbackListener, CancelHandle, DEFAULT_SUCCESS_PAGE,
};
pub use pkce::PkcePair;

use crate::error::{Error, Result};
use crate::exchange::{TokenExchanger, grant};
use crate::provider::Provider;
use crate::token::TokenRecord;

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from the provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for the authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider endpoint configuration.
    pub provider: Provider,
    /// Carry client credentials in an HTTP Basic header instead of the
    /// request body.
    pub use_basic_auth: bool,
    exchanger: TokenExchanger,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            use_basic_auth: false,
            exchanger: TokenExchanger::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sends client credentials in an HTTP Basic header on token endpoint
    /// requests.
    #[must_use]
    pub const fn with_basic_auth(mut self) -> Self {
        self.use_basic_auth = true;
        self
    }

    /// Refreshes an access token using the record's refresh token.
    ///
    /// The returned record keeps the old refresh token when the provider
    /// does not rotate it. The caller decides where (and whether) to persist
    /// it, e.g. via [`crate::store::update`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no refresh token, the request
    /// fails at the transport level, or the provider rejects the grant.
    pub async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord> {
        let refresh_token = record
            .refresh_token()
            .ok_or_else(|| Error::InvalidConfig("token record has no refresh token".into()))?;

        let params = grant::refresh_token(refresh_token, None);
        let raw = self
            .exchanger
            .exchange(
                &self.provider.token_url,
                &params,
                &self.client_id,
                self.client_secret.as_deref(),
                self.use_basic_auth,
            )
            .await?;

        let mut refreshed = TokenRecord::from_response(raw.into_token()?);

        // Preserve the refresh token if the provider did not rotate it.
        if refreshed.refresh_token.is_empty() {
            refreshed.refresh_token.clone_from(&record.refresh_token);
        }

        Ok(refreshed)
    }

    pub(crate) const fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }
}
