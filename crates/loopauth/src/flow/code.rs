//! Authorization Code Flow orchestration.
//!
//! One call composes the whole flow: build the authorization URL, hand it to
//! the browser hook, await the loopback callback, validate `state`, exchange
//! the code, and return (optionally persist) the token record. Any step's
//! failure aborts the run; retrying requires a fresh flow so that state and
//! PKCE values are never reused.

use super::authorize::AuthorizationUrl;
use super::listener::{CallbackListener, CancelHandle};
use super::pkce::PkcePair;
use super::OAuthClient;
use crate::error::{Error, Result};
use crate::exchange::grant;
use crate::random;
use crate::store;
use crate::token::TokenRecord;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default wait for the authorization callback (5 minutes).
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Hook that hands the authorization URL to the user.
///
/// Browser opening is a UI-level concern; the default hook only logs the
/// URL. Use [`open_in_browser`] for the common desktop case.
pub type UrlOpener = Box<dyn Fn(&Url) + Send + Sync>;

/// Opens the URL in the system browser.
///
/// # Errors
///
/// Returns [`Error::Browser`] if no browser could be launched.
pub fn open_in_browser(url: &Url) -> Result<()> {
    opener::open(url.as_str()).map_err(|e| Error::Browser(e.to_string()))
}

/// Authorization Code Flow for `OAuth2`.
///
/// Suitable for applications that can open a browser and receive the
/// authorization code via a loopback redirect.
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
    use_pkce: bool,
    scopes: Option<Vec<String>>,
    access_type: Option<String>,
    timeout: Duration,
    success_page: Option<String>,
    token_path: Option<PathBuf>,
    opener: UrlOpener,
    cancel: CancelHandle,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub fn new(client: OAuthClient) -> Self {
        Self {
            client,
            use_pkce: false,
            scopes: None,
            access_type: None,
            timeout: DEFAULT_CALLBACK_TIMEOUT,
            success_page: None,
            token_path: None,
            opener: Box::new(|url| {
                tracing::info!(%url, "open this URL in a browser to authorize");
            }),
            cancel: CancelHandle::new(),
        }
    }

    /// Enables PKCE (recommended for public clients).
    #[must_use]
    pub const fn with_pkce(mut self) -> Self {
        self.use_pkce = true;
        self
    }

    /// Overrides the provider's default scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the `access_type` authorization parameter (e.g., `offline`).
    #[must_use]
    pub fn with_access_type(mut self, access_type: impl Into<String>) -> Self {
        self.access_type = Some(access_type.into());
        self
    }

    /// Sets how long to wait for the authorization callback.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the HTML page shown to the user after the redirect.
    #[must_use]
    pub fn with_success_page(mut self, page: impl Into<String>) -> Self {
        self.success_page = Some(page.into());
        self
    }

    /// Persists the resulting token record to `path` on success.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Replaces the hook that hands the authorization URL to the user.
    #[must_use]
    pub fn with_url_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Returns a handle that abandons the flow while it waits for the
    /// callback, releasing the bound port.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the full flow and returns the resulting token record.
    ///
    /// Observable step order: URL build, listener bind, opener hook,
    /// callback receipt, state check, code exchange, store update.
    ///
    /// # Errors
    ///
    /// Any step's failure aborts the flow with the matching [`Error`]
    /// variant; nothing is retried internally. A state mismatch fails before
    /// any exchange is attempted, and nothing is persisted unless the whole
    /// flow succeeded.
    pub async fn run(self) -> Result<TokenRecord> {
        self.client.provider.validate()?;
        let redirect_uri = self.client.redirect_uri.clone().ok_or_else(|| {
            Error::InvalidConfig("redirect_uri is required for the authorization code flow".into())
        })?;
        let redirect = Url::parse(&redirect_uri)?;
        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidConfig("redirect_uri has no usable port".into()))?;

        // Fresh single-use values for this attempt.
        let state = random::state_token()?;
        let pkce = if self.use_pkce {
            Some(PkcePair::generate()?)
        } else {
            None
        };

        let scopes = self
            .scopes
            .clone()
            .unwrap_or_else(|| self.client.provider.default_scopes.clone());

        let mut auth_url = AuthorizationUrl::new(
            self.client.provider.auth_url.clone(),
            &self.client.client_id,
        )
        .with_redirect_uri(&redirect_uri)
        .with_state(&state)
        .with_scopes(&scopes);
        if let Some(access_type) = &self.access_type {
            auth_url = auth_url.with_access_type(access_type);
        }
        if let Some(pkce) = &pkce {
            auth_url = auth_url.with_code_challenge(pkce.challenge());
        }
        let auth_url = auth_url.build();

        let mut listener = CallbackListener::bind(port, redirect.path())
            .await?
            .with_cancel(&self.cancel);
        if let Some(page) = &self.success_page {
            listener = listener.with_page(page.clone());
        }

        tracing::debug!(port, pkce = self.use_pkce, "authorization flow started");
        (self.opener)(&auth_url);

        let response = listener.wait(self.timeout).await?;

        if !state_matches(&response.state, &state) {
            tracing::warn!("state mismatch in authorization callback");
            return Err(Error::StateMismatch);
        }

        let params = grant::authorization_code(
            &response.code,
            Some(&redirect_uri),
            pkce.as_ref().map(PkcePair::verifier),
        );
        let raw = self
            .client
            .exchanger()
            .exchange(
                &self.client.provider.token_url,
                &params,
                &self.client.client_id,
                self.client.client_secret.as_deref(),
                self.client.use_basic_auth,
            )
            .await?;

        let record = TokenRecord::from_response(raw.into_token()?);

        if let Some(path) = &self.token_path {
            store::save(path, &record)?;
        }

        tracing::debug!("authorization flow completed");
        Ok(record)
    }
}

/// Compares the echoed state against the generated one without
/// short-circuiting on the first differing byte.
fn state_matches(echoed: &str, expected: &str) -> bool {
    let (a, b) = (echoed.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
