//! Token endpoint exchange.
//!
//! One primitive covers every grant type: encode a parameter map as
//! `application/x-www-form-urlencoded`, POST it, and hand the raw response
//! back. Non-code grants differ only in the parameter map (see [`grant`]).

use crate::error::{Error, Result};
use crate::token::{ErrorResponse, TokenResponse};
use reqwest::{Client, StatusCode};
use url::Url;

/// Performs code-for-token (or refresh, or other grant) exchanges against a
/// provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: Client,
}

impl Default for TokenExchanger {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw transport response from the token endpoint.
///
/// A non-2xx status is not itself a local failure; inspect the body with
/// [`RawResponse::into_token`] to surface a provider error.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response body.
    pub body: String,
}

impl TokenExchanger {
    /// Creates a new exchanger with its own HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Title-case header serialization keeps the wire format
            // consistent regardless of the HTTP stack's default casing.
            http: Client::builder()
                .http1_title_case_headers()
                .build()
                .unwrap_or_default(),
        }
    }

    /// POSTs `params` plus client credentials to `token_url`.
    ///
    /// Credentials travel as body fields, or in an HTTP Basic header when
    /// `use_basic_auth` is set (in which case they are omitted from the
    /// body).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] only for network-level failures (DNS,
    /// connection refused, timeout).
    pub async fn exchange(
        &self,
        token_url: &Url,
        params: &[(&str, String)],
        client_id: &str,
        client_secret: Option<&str>,
        use_basic_auth: bool,
    ) -> Result<RawResponse> {
        let mut form: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if !use_basic_auth {
            form.push(("client_id", client_id));
            if let Some(secret) = client_secret {
                form.push(("client_secret", secret));
            }
        }

        let mut request = self.http.post(token_url.clone()).form(&form);
        if use_basic_auth {
            request = request.basic_auth(client_id, client_secret);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(%status, url = %token_url, "token endpoint responded");

        Ok(RawResponse { status, body })
    }
}

impl RawResponse {
    /// Interprets the payload as a token response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when the endpoint answered with an
    /// `OAuth2` error payload, [`Error::InvalidResponse`] when a non-2xx
    /// body is not an error payload, and [`Error::Json`] when a 2xx body is
    /// not a token.
    pub fn into_token(self) -> Result<TokenResponse> {
        if !self.status.is_success() {
            return match serde_json::from_str::<ErrorResponse>(&self.body) {
                Ok(err) => Err(err.into_error()),
                Err(_) => Err(Error::InvalidResponse(format!(
                    "{}: {}",
                    self.status, self.body
                ))),
            };
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Grant parameter maps for the token exchange primitive.
pub mod grant {
    /// Parameters for an authorization-code exchange.
    #[must_use]
    pub fn authorization_code(
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
        ];
        if let Some(uri) = redirect_uri {
            params.push(("redirect_uri", uri.to_string()));
        }
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier.to_string()));
        }
        params
    }

    /// Parameters for a refresh-token grant.
    #[must_use]
    pub fn refresh_token(token: &str, scope: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", token.to_string()),
        ];
        if let Some(scope) = scope {
            params.push(("scope", scope.to_string()));
        }
        params
    }

    /// Parameters for a client-credentials grant.
    #[must_use]
    pub fn client_credentials(scope: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![("grant_type", "client_credentials".to_string())];
        if let Some(scope) = scope {
            params.push(("scope", scope.to_string()));
        }
        params
    }

    /// Parameters for a resource-owner-password grant.
    #[must_use]
    pub fn password(
        username: &str,
        password: &str,
        scope: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("grant_type", "password".to_string()),
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        if let Some(scope) = scope {
            params.push(("scope", scope.to_string()));
        }
        params
    }
}
