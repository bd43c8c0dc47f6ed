//! Authorization URL construction.

use url::Url;

/// Builds the provider authorization endpoint URL.
///
/// Always appends `response_type=code` and `client_id`; the remaining
/// parameters are appended only when set. A pre-existing query string on the
/// base URL is preserved and merged.
#[derive(Debug, Clone)]
pub struct AuthorizationUrl {
    base: Url,
    client_id: String,
    redirect_uri: Option<String>,
    state: Option<String>,
    scopes: Vec<String>,
    access_type: Option<String>,
    code_challenge: Option<String>,
}

impl AuthorizationUrl {
    /// Creates a builder for the given authorization endpoint and client id.
    #[must_use]
    pub fn new(base: Url, client_id: impl Into<String>) -> Self {
        Self {
            base,
            client_id: client_id.into(),
            redirect_uri: None,
            state: None,
            scopes: Vec::new(),
            access_type: None,
            code_challenge: None,
        }
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sets the CSRF state parameter.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the requested scopes (space-joined in the URL).
    #[must_use]
    pub fn with_scopes(mut self, scopes: &[String]) -> Self {
        self.scopes = scopes.to_vec();
        self
    }

    /// Sets the `access_type` parameter (e.g., `offline`).
    #[must_use]
    pub fn with_access_type(mut self, access_type: impl Into<String>) -> Self {
        self.access_type = Some(access_type.into());
        self
    }

    /// Sets the PKCE code challenge; `code_challenge_method=S256` is
    /// appended alongside it.
    #[must_use]
    pub fn with_code_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.code_challenge = Some(challenge.into());
        self
    }

    /// Composes the final URL.
    #[must_use]
    pub fn build(&self) -> Url {
        let mut url = self.base.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id);

            if let Some(redirect_uri) = &self.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope_str = self.scopes.join(" ");
            if !scope_str.is_empty() {
                pairs.append_pair("scope", &scope_str);
            }

            if let Some(state) = &self.state {
                pairs.append_pair("state", state);
            }

            if let Some(access_type) = &self.access_type {
                pairs.append_pair("access_type", access_type);
            }

            if let Some(challenge) = &self.code_challenge {
                pairs
                    .append_pair("code_challenge", challenge)
                    .append_pair("code_challenge_method", "S256");
            }
        }

        url
    }
}
