//! Example: full authorization code flow against a custom provider
//!
//! This example demonstrates how to:
//! 1. Configure an OAuth2 provider (authorization + token endpoints)
//! 2. Run the authorization code flow with PKCE and a loopback listener
//! 3. Persist the resulting token record and refresh it later
//!
//! ## Prerequisites
//!
//! Register an application with your identity provider, set the redirect
//! URI to `http://localhost:8080/cb`, and export:
//!
//! ```bash
//! export OAUTH_AUTH_URL="https://idp.example.com/authorize"
//! export OAUTH_TOKEN_URL="https://idp.example.com/token"
//! export OAUTH_CLIENT_ID="your-client-id-here"
//! export OAUTH_SCOPES="email profile"
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo run --example authorize
//! ```

use loopauth::{AuthorizationCodeFlow, OAuthClient, Provider, open_in_browser, store};
use std::env;
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let auth_url = env::var("OAUTH_AUTH_URL")?;
    let token_url = env::var("OAUTH_TOKEN_URL")?;
    let client_id = env::var("OAUTH_CLIENT_ID")?;
    let scopes: Vec<String> = env::var("OAUTH_SCOPES")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let token_path = Path::new("token.json");

    // Reuse a stored token when it is still valid, refresh when possible.
    match store::load(token_path) {
        Ok(record) if !record.is_expired() => {
            println!("Stored token is still valid; nothing to do.");
            return Ok(());
        }
        Ok(record) if record.refresh_token().is_some() => {
            println!("Stored token expired; refreshing...");
            let provider = Provider::new(&auth_url, &token_url)?;
            let client = OAuthClient::new(&client_id, provider);
            let refreshed = client.refresh(&record).await?;
            store::save(token_path, &refreshed)?;
            println!("Refreshed. Access token: {}...", &refreshed.access_token[..16]);
            return Ok(());
        }
        _ => {}
    }

    // No usable token: run the full browser flow.
    let provider = Provider::new(&auth_url, &token_url)?.with_default_scopes(scopes);
    let client =
        OAuthClient::new(&client_id, provider).with_redirect_uri("http://localhost:8080/cb");

    let flow = AuthorizationCodeFlow::new(client)
        .with_pkce()
        .with_timeout(Duration::from_secs(300))
        .with_token_path(token_path)
        .with_url_opener(Box::new(|url| {
            println!("Opening browser for authorization...");
            if open_in_browser(url).is_err() {
                println!("Could not open a browser. Visit:\n\n{url}\n");
            }
        }));

    println!("Waiting for the authorization callback on http://localhost:8080/cb ...");
    let record = flow.run().await?;

    println!("Authorized!");
    println!("  Access token: {}...", &record.access_token[..16]);
    println!("  Expires in: {}s", record.expires_in);
    println!("  Has refresh token: {}", record.refresh_token().is_some());
    println!("  Saved to {}", token_path.display());

    Ok(())
}
