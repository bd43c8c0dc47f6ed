//! Local callback listener for the authorization redirect.
//!
//! Captures exactly one browser redirect carrying the authorization result,
//! then releases the socket. [`CallbackListener::wait`] consumes the
//! listener, so the port is freed on every exit path: success, provider
//! error, timeout, and cancellation alike.

use crate::error::{Error, Result};
use crate::token::ErrorResponse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// Minimal HTML page shown to the user after the redirect lands.
pub const DEFAULT_SUCCESS_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Authorization complete</title></head>\
<body><p>Authorization complete. You may close this tab.</p></body></html>";

/// Authorization result parsed from the redirect's query string.
///
/// Ephemeral; consumed immediately by the exchange step.
#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    /// Authorization code to exchange for tokens.
    pub code: String,
    /// State echoed by the authorization server.
    pub state: String,
}

/// Handle for abandoning an in-flight [`CallbackListener::wait`].
///
/// Cloneable; cancelling before `wait` starts is remembered.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    notify: Arc<Notify>,
}

impl CancelHandle {
    /// Creates a handle not yet attached to a listener; attach it with
    /// [`CallbackListener::with_cancel`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
        }
    }

    /// Cancels the wait; the listener returns [`Error::Cancelled`] and
    /// releases its port.
    pub fn cancel(&self) {
        self.notify.notify_one();
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot loopback listener for the authorization redirect.
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
    path: String,
    page: String,
    cancel: Arc<Notify>,
}

impl CallbackListener {
    /// Binds a loopback listener on `port` (0 lets the OS pick) that will
    /// answer redirects on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the port is unavailable.
    pub async fn bind(port: u16, path: &str) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| Error::Bind { port, source })?;
        let port = listener
            .local_addr()
            .map_err(|source| Error::Bind { port, source })?
            .port();

        tracing::debug!(port, path, "callback listener bound");

        Ok(Self {
            listener,
            port,
            path: path.to_string(),
            page: DEFAULT_SUCCESS_PAGE.to_string(),
            cancel: Arc::new(Notify::new()),
        })
    }

    /// Replaces the HTML page rendered to the browser.
    #[must_use]
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = page.into();
        self
    }

    /// Attaches an externally created cancel handle, replacing the
    /// listener's own.
    #[must_use]
    pub fn with_cancel(mut self, handle: &CancelHandle) -> Self {
        self.cancel = Arc::clone(&handle.notify);
        self
    }

    /// Returns the bound local port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns a handle that cancels a pending [`Self::wait`].
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            notify: Arc::clone(&self.cancel),
        }
    }

    /// Waits until one request matching the configured path arrives, the
    /// timeout elapses, or the wait is cancelled.
    ///
    /// Requests on other paths (browser favicon probes and the like) get a
    /// 404 and do not consume the listener. The listener is dropped when
    /// this returns, so later requests are refused without reopening it.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] after `timeout`, [`Error::Cancelled`] via the
    /// cancel handle, [`Error::Provider`] when the redirect carries an
    /// `error` parameter, and [`Error::RedirectParse`] when the query string
    /// is malformed.
    pub async fn wait(self, timeout: Duration) -> Result<AuthorizationResponse> {
        let result = tokio::select! {
            accepted = tokio::time::timeout(timeout, Self::accept_loop(&self.listener, &self.path, &self.page)) => {
                match accepted {
                    Ok(result) => result,
                    // Round up so a sub-second timeout never reports 0.
                    Err(_) => Err(Error::Timeout(
                        timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0),
                    )),
                }
            }
            () = self.cancel.notified() => Err(Error::Cancelled),
        };

        match &result {
            Ok(_) => tracing::debug!(port = self.port, "authorization callback received"),
            Err(e) => tracing::debug!(port = self.port, error = %e, "callback wait ended"),
        }
        result
    }

    async fn accept_loop(
        listener: &TcpListener,
        path: &str,
        page: &str,
    ) -> Result<AuthorizationResponse> {
        loop {
            let (stream, _peer) = listener.accept().await?;
            // Per-connection I/O failures (browser preconnects that reset
            // without sending a request, failed responses) must not consume
            // the listener; the real redirect may still be on its way.
            match Self::handle_connection(stream, path, page).await {
                Ok(Some(result)) => return result,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "callback connection failed, still waiting");
                }
            }
        }
    }

    /// Handles one connection. `Ok(None)` means the request did not match
    /// the callback path and the listener should keep waiting.
    async fn handle_connection(
        stream: TcpStream,
        path: &str,
        page: &str,
    ) -> Result<Option<Result<AuthorizationResponse>>> {
        let mut stream = BufReader::new(stream);

        let mut request_line = String::new();
        stream.read_line(&mut request_line).await?;

        // Drain the headers; the redirect carries everything in the URL.
        loop {
            let mut line = String::new();
            let n = stream.read_line(&mut line).await?;
            if n == 0 || line == "\r\n" || line == "\n" {
                break;
            }
        }

        let target = request_line.split_whitespace().nth(1).unwrap_or("/");
        let (req_path, query) = target.split_once('?').unwrap_or((target, ""));

        if req_path != path {
            respond(&mut stream, "404 Not Found", "text/plain", "not found").await?;
            return Ok(None);
        }

        let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        if let Some(error) = params.get("error") {
            respond(&mut stream, "200 OK", "text/html; charset=utf-8", page).await?;
            let provider_error = ErrorResponse {
                error: error.clone(),
                error_description: params.get("error_description").cloned().unwrap_or_default(),
                error_uri: params.get("error_uri").cloned(),
                state: params.get("state").cloned(),
            };
            return Ok(Some(Err(provider_error.into_error())));
        }

        let (Some(code), Some(state)) = (params.get("code"), params.get("state")) else {
            respond(&mut stream, "400 Bad Request", "text/plain", "bad request").await?;
            return Ok(Some(Err(Error::RedirectParse(
                "callback query string is missing code or state".to_string(),
            ))));
        };

        respond(&mut stream, "200 OK", "text/html; charset=utf-8", page).await?;
        Ok(Some(Ok(AuthorizationResponse {
            code: code.clone(),
            state: state.clone(),
        })))
    }
}

async fn respond(
    stream: &mut BufReader<TcpStream>,
    status: &str,
    content_type: &str,
    body: &str,
) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.get_mut().write_all(response.as_bytes()).await?;
    stream.get_mut().shutdown().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn send_request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!("GET {target} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_success_callback() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));
        let body = send_request(port, "/cb?code=XYZ&state=S1").await;
        assert!(body.contains("200 OK"));
        assert!(body.contains("Authorization complete"));

        let response = waiter.await.unwrap().unwrap();
        assert_eq!(response.code, "XYZ");
        assert_eq!(response.state, "S1");

        // Port is released after success.
        let rebound = CallbackListener::bind(port, "/cb").await;
        assert!(rebound.is_ok());
    }

    #[tokio::test]
    async fn test_error_redirect_becomes_provider_error() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));
        send_request(
            port,
            "/cb?error=access_denied&error_description=user%20said%20no&state=S1",
        )
        .await;

        match waiter.await.unwrap() {
            Err(Error::Provider {
                error,
                description,
                state,
                ..
            }) => {
                assert_eq!(error, "access_denied");
                assert_eq!(description, "user said no");
                assert_eq!(state.as_deref(), Some("S1"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stray_reset_connection_keeps_listening() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));

        // A browser-style speculative preconnect that resets without ever
        // sending a request.
        let stray = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stray.set_linger(Some(Duration::ZERO)).unwrap();
        drop(stray);
        tokio::time::sleep(Duration::from_millis(50)).await;

        send_request(port, "/cb?code=XYZ&state=S1").await;
        let response = waiter.await.unwrap().unwrap();
        assert_eq!(response.code, "XYZ");
        assert_eq!(response.state, "S1");
    }

    #[tokio::test]
    async fn test_non_matching_path_keeps_listening() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));
        let probe = send_request(port, "/favicon.ico").await;
        assert!(probe.contains("404"));

        send_request(port, "/cb?code=XYZ&state=S1").await;
        let response = waiter.await.unwrap().unwrap();
        assert_eq!(response.code, "XYZ");
    }

    #[tokio::test]
    async fn test_missing_code_is_redirect_parse_error() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));
        let body = send_request(port, "/cb?state=S1").await;
        assert!(body.contains("400"));

        assert!(matches!(
            waiter.await.unwrap(),
            Err(Error::RedirectParse(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_releases_port() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();

        let result = listener.wait(Duration::from_millis(50)).await;
        // Sub-second timeouts round up rather than reporting 0 seconds.
        assert!(matches!(result, Err(Error::Timeout(1))));

        let rebound = CallbackListener::bind(port, "/cb").await;
        assert!(rebound.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_releases_port() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = listener.port();
        let handle = listener.cancel_handle();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(30)));
        handle.cancel();
        assert!(matches!(waiter.await.unwrap(), Err(Error::Cancelled)));

        let rebound = CallbackListener::bind(port, "/cb").await;
        assert!(rebound.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_remembered() {
        let listener = CallbackListener::bind(0, "/cb").await.unwrap();
        listener.cancel_handle().cancel();
        let result = listener.wait(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_custom_page() {
        let listener = CallbackListener::bind(0, "/cb")
            .await
            .unwrap()
            .with_page("<html><body>all done</body></html>");
        let port = listener.port();

        let waiter = tokio::spawn(listener.wait(Duration::from_secs(5)));
        let body = send_request(port, "/cb?code=XYZ&state=S1").await;
        assert!(body.contains("all done"));
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_error_on_taken_port() {
        let first = CallbackListener::bind(0, "/cb").await.unwrap();
        let port = first.port();

        let second = CallbackListener::bind(port, "/cb").await;
        assert!(matches!(second, Err(Error::Bind { port: p, .. }) if p == port));
    }
}
