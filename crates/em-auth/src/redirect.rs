use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::{AuthError, Result};

/// Page shown in the browser tab once the code has been captured
const CLOSE_TAB_HTML: &str = "<html><style>:root{color-scheme:dark;}\
body{display:flex;justify-content:center;align-items:center;flex-direction:column;\
height:100vh;margin:0;font-family:sans-serif;}</style>\
<body><h1>Successfully linked!</h1><h3>You can now close this tab</h3></body></html>";

/// Source of the interactive authorization code.
///
/// The chain only ever needs a code in exchange for an authorize URL,
/// so the browser-plus-listener dance sits behind this seam; tests
/// inject a canned code instead.
#[async_trait::async_trait]
pub trait CodeProvider: Send + Sync {
    async fn obtain_code(&self, authorize_url: &Url) -> Result<String>;
}

/// Production code provider: opens the system browser at the authorize
/// URL and waits on the loopback listener for the redirect.
#[derive(Debug, Clone)]
pub struct BrowserCodeProvider {
    port: u16,
    deadline: Option<Duration>,
}

impl BrowserCodeProvider {
    pub fn new(port: u16, deadline: Option<Duration>) -> Self {
        Self { port, deadline }
    }
}

#[async_trait::async_trait]
impl CodeProvider for BrowserCodeProvider {
    async fn obtain_code(&self, authorize_url: &Url) -> Result<String> {
        // Bind before opening the browser so the redirect cannot race
        // an unbound port.
        let listener = bind(self.port).await?;
        open_browser(authorize_url)?;
        capture_code(listener, self.deadline).await
    }
}

pub(crate) async fn bind(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    debug!("Redirect listener bound on 127.0.0.1:{}", port);
    Ok(listener)
}

/// Accept exactly one request, pull the `code` query parameter out of
/// it, answer with a close-this-tab page and unbind.
///
/// The port is fixed and reused across attempts, so the listener must
/// not stay bound longer than the single exchange needs.
#[instrument(skip(listener))]
pub(crate) async fn capture_code(
    listener: TcpListener,
    deadline: Option<Duration>,
) -> Result<String> {
    let accept = accept_one(listener);
    match deadline {
        Some(limit) => timeout(limit, accept)
            .await
            .map_err(|_| AuthError::RedirectTimeout)?,
        None => accept.await,
    }
}

async fn accept_one(listener: TcpListener) -> Result<String> {
    let (mut stream, peer) = listener.accept().await?;
    debug!("Accepted redirect connection from {}", peer);

    // Only the request line matters; read until the header block ends
    // or the buffer fills.
    let mut buf = Vec::with_capacity(2048);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 16 * 1024 {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let result = parse_request_line(&head);

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        CLOSE_TAB_HTML.len(),
        CLOSE_TAB_HTML
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to write close-tab response: {}", e);
    }
    let _ = stream.shutdown().await;

    // Listener drops here, releasing the fixed port immediately.
    result
}

fn parse_request_line(head: &str) -> Result<String> {
    let request_line = head.lines().next().unwrap_or_default();
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MissingCode)?;

    let url = Url::parse(&format!("http://127.0.0.1{}", target))?;
    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" if value == "access_denied" => return Err(AuthError::UserCancelled),
            "code" => code = Some(value.into_owned()),
            _ => {}
        }
    }

    code.ok_or(AuthError::MissingCode)
}

/// Open the provider's authorization page in the user's browser
pub fn open_browser(url: &Url) -> Result<()> {
    debug!("Opening authorization page: {}", url);

    #[cfg(target_os = "windows")]
    let command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", "", url.as_str()]);
        c
    };
    #[cfg(target_os = "macos")]
    let command = {
        let mut c = std::process::Command::new("open");
        c.arg(url.as_str());
        c
    };
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url.as_str());
        c
    };

    let mut command = command;
    command.spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    async fn send_request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n", target);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn captures_code_from_single_request() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let capture = tokio::spawn(capture_code(listener, Some(Duration::from_secs(5))));
        let response = send_request(port, "/msa?code=abc123&state=xyz").await;

        assert!(response.contains("close this tab"));
        assert_eq!(capture.await.unwrap().unwrap(), "abc123");
    }

    #[tokio::test]
    async fn access_denied_maps_to_user_cancelled() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let capture = tokio::spawn(capture_code(listener, Some(Duration::from_secs(5))));
        send_request(port, "/msa?error=access_denied").await;

        assert!(matches!(
            capture.await.unwrap(),
            Err(AuthError::UserCancelled)
        ));
    }

    #[tokio::test]
    async fn missing_code_is_an_error() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let capture = tokio::spawn(capture_code(listener, Some(Duration::from_secs(5))));
        send_request(port, "/msa?state=only").await;

        assert!(matches!(capture.await.unwrap(), Err(AuthError::MissingCode)));
    }

    #[tokio::test]
    async fn deadline_bounds_the_wait() {
        let listener = bind(0).await.unwrap();
        let result = capture_code(listener, Some(Duration::from_millis(50))).await;
        assert!(matches!(result, Err(AuthError::RedirectTimeout)));
    }

    #[tokio::test]
    async fn port_is_released_after_capture() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let capture = tokio::spawn(capture_code(listener, Some(Duration::from_secs(5))));
        send_request(port, "/msa?code=x").await;
        capture.await.unwrap().unwrap();

        // The fixed port must be immediately reusable.
        bind(port).await.unwrap();
    }
}
