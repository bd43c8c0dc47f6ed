//! # loopauth
//!
//! `OAuth2` Authorization Code flow client with PKCE and a local loopback
//! callback listener.
//!
//! ## Features
//!
//! - **Authorization Code Flow**: one call builds the authorization URL,
//!   awaits the browser redirect on a loopback listener, validates `state`,
//!   and exchanges the code for tokens
//! - **PKCE** (RFC 7636): S256 verifier/challenge pairs, one per attempt
//! - **Token management**: expiration checking with a refresh buffer,
//!   refresh-token grant, atomic token file persistence
//! - **Uniform exchange primitive**: refresh, client-credentials, and
//!   password grants reuse the same token endpoint call with a different
//!   parameter map
//!
//! ## Quick Start
//!
//! ```ignore
//! use loopauth::{AuthorizationCodeFlow, OAuthClient, Provider, open_in_browser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::new(
//!         "https://idp.example.com/authorize",
//!         "https://idp.example.com/token",
//!     )?;
//!     let client = OAuthClient::new("your_client_id", provider)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("http://localhost:8080/cb");
//!
//!     let flow = AuthorizationCodeFlow::new(client)
//!         .with_pkce()
//!         .with_scopes(vec!["email".to_string()])
//!         .with_token_path("token.json")
//!         .with_url_opener(Box::new(|url| {
//!             let _ = open_in_browser(url);
//!         }));
//!
//!     // Keep a handle around so the attempt can be abandoned.
//!     let cancel = flow.cancel_handle();
//!
//!     let token = flow.run().await?;
//!     println!("Access token: {}", token.access_token);
//!     drop(cancel);
//!     Ok(())
//! }
//! ```
//!
//! ## Token Refresh
//!
//! ```ignore
//! use loopauth::store;
//!
//! let record = store::load("token.json".as_ref())?;
//! if record.is_expired() {
//!     let refreshed = client.refresh(&record).await?;
//!     store::save("token.json".as_ref(), &refreshed)?;
//! }
//! ```
//!
//! ## Error handling
//!
//! Every failure is a distinct [`Error`] variant; the library never retries
//! internally. `StateMismatch` and `Provider` errors are hard aborts, while
//! `Timeout` and `Transport` are sensible to retry with a fresh flow (fresh
//! state and PKCE values are generated per run).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
#[cfg(test)]
mod test_util;

pub mod exchange;
pub mod flow;
pub mod provider;
pub mod random;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use exchange::{RawResponse, TokenExchanger};
pub use flow::{
    AuthorizationCodeFlow, AuthorizationResponse, AuthorizationUrl, CallbackListener,
    CancelHandle, OAuthClient, PkcePair, UrlOpener, open_in_browser,
};
pub use provider::Provider;
pub use token::{TokenRecord, TokenResponse};
