//! HTTP transport for the Roblox web APIs.
//!
//! Every API surface in this crate talks through the [`Transport`] trait so
//! tests can substitute a recording mock for the real session.

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{ApiError, Result};

pub const GROUPS_BASE: &str = "https://groups.roblox.com";
pub const USERS_BASE: &str = "https://users.roblox.com";
pub const ACCOUNT_INFORMATION_BASE: &str = "https://accountinformation.roblox.com";

const CSRF_HEADER: &str = "x-csrf-token";

/// The request capability the typed wrappers are built on.
///
/// Each method performs a single authenticated request and returns the
/// parsed JSON body, or [`ApiError::Http`] for any non-2xx status. Nothing
/// here retries or suppresses failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value>;
    async fn post(&self, url: &str, body: Value) -> Result<Value>;
    async fn patch(&self, url: &str, body: Value) -> Result<Value>;
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Authenticated session against the Roblox web APIs.
///
/// Carries the `.ROBLOSECURITY` cookie on every request. Roblox answers
/// state-changing requests that lack an `X-CSRF-TOKEN` header with a 403
/// carrying a fresh token; the session captures that token and replays the
/// request once. Anything else non-2xx surfaces as [`ApiError::Http`].
pub struct RobloxSession {
    client: reqwest::Client,
    cookie: String,
    csrf_token: Mutex<Option<String>>,
}

impl RobloxSession {
    /// Creates a session from a `.ROBLOSECURITY` cookie value.
    pub fn new(roblosecurity: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cookie: roblosecurity.into(),
            csrf_token: Mutex::new(None),
        }
    }

    /// Creates a session from the `ROBLOSECURITY` environment variable.
    pub fn from_env() -> Result<Self> {
        std::env::var("ROBLOSECURITY")
            .map(Self::new)
            .map_err(|_| ApiError::MissingCookie)
    }

    async fn execute(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let mut replayed = false;
        loop {
            let mut request = self
                .client
                .request(method.clone(), url)
                .header(
                    reqwest::header::COOKIE,
                    format!(".ROBLOSECURITY={}", self.cookie),
                );
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(token) = self.csrf_token.lock().await.clone() {
                request = request.header(CSRF_HEADER, token);
            }

            debug!("{method} {url}");
            let response = request.send().await?;

            // A 403 carrying a token header is a CSRF challenge, not a real
            // denial. Capture the token and replay exactly once.
            if response.status() == reqwest::StatusCode::FORBIDDEN && !replayed {
                if let Some(token) = response
                    .headers()
                    .get(CSRF_HEADER)
                    .and_then(|v| v.to_str().ok())
                {
                    warn!("CSRF challenge from {url}, replaying with fresh token");
                    *self.csrf_token.lock().await = Some(token.to_string());
                    replayed = true;
                    continue;
                }
            }

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
            return Ok(response);
        }
    }
}

#[async_trait]
impl Transport for RobloxSession {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        let response = self.execute(reqwest::Method::GET, url, query, None).await?;
        Ok(response.json().await?)
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value> {
        let response = self
            .execute(reqwest::Method::POST, url, &[], Some(&body))
            .await?;
        Ok(response.json().await?)
    }

    async fn patch(&self, url: &str, body: Value) -> Result<Value> {
        let response = self
            .execute(reqwest::Method::PATCH, url, &[], Some(&body))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.execute(reqwest::Method::DELETE, url, &[], None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Serves one raw scripted response per connection and reports each
    /// request head it saw. `connection: close` in every response keeps
    /// the client from pooling, so one request means one accept.
    async fn spawn_scripted(responses: Vec<String>) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut head = String::new();
                let mut buf = vec![0u8; 4096];
                loop {
                    let n = match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    head.push_str(&String::from_utf8_lossy(&buf[..n]));
                    if head.contains("\r\n\r\n") {
                        break;
                    }
                }
                let _ = tx.send(head);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            }
        });

        (base, rx)
    }

    fn forbidden_with_token(token: &str) -> String {
        format!(
            "HTTP/1.1 403 Forbidden\r\nx-csrf-token: {token}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        )
    }

    fn ok_json() -> String {
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}"
            .to_string()
    }

    #[tokio::test]
    async fn csrf_challenge_is_replayed_exactly_once() {
        let (base, mut seen) =
            spawn_scripted(vec![forbidden_with_token("abc"), ok_json()]).await;
        let session = RobloxSession::new("secret-cookie");

        session
            .patch(&format!("{base}/v1/groups/5/users/77"), json!({"roleId": 12}))
            .await
            .unwrap();

        let first = seen.recv().await.unwrap().to_lowercase();
        let second = seen.recv().await.unwrap().to_lowercase();
        assert!(!first.contains("x-csrf-token"));
        assert!(first.contains(".roblosecurity=secret-cookie"));
        assert!(second.contains("x-csrf-token: abc"));
        // The challenge plus one replay; nothing else reached the server.
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn forbidden_again_after_the_replay_surfaces_as_http() {
        let (base, mut seen) = spawn_scripted(vec![
            forbidden_with_token("abc"),
            forbidden_with_token("def"),
        ])
        .await;
        let session = RobloxSession::new("secret-cookie");

        let err = session
            .patch(&format!("{base}/v1/groups/5/users/77"), json!({"roleId": 12}))
            .await
            .unwrap_err();

        match err {
            ApiError::Http { status, .. } => assert_eq!(status, 403),
            other => panic!("expected Http, got {other:?}"),
        }
        assert!(seen.recv().await.is_some());
        assert!(seen.recv().await.is_some());
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn captured_token_is_sent_on_later_requests_without_a_new_challenge() {
        let (base, mut seen) =
            spawn_scripted(vec![forbidden_with_token("abc"), ok_json(), ok_json()]).await;
        let session = RobloxSession::new("secret-cookie");

        let url = format!("{base}/v1/groups/5/users/77");
        session.patch(&url, json!({"roleId": 12})).await.unwrap();
        session.patch(&url, json!({"roleId": 11})).await.unwrap();

        let _challenge = seen.recv().await.unwrap();
        let _replay = seen.recv().await.unwrap();
        let third = seen.recv().await.unwrap().to_lowercase();
        assert!(third.contains("x-csrf-token: abc"));
        assert!(seen.try_recv().is_err());
    }
}
