//! Common test utilities for E2E tests

use gatehouse::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub _temp_dir: TempDir,
}

impl TestServer {
    /// Create a test server pointing at a placeholder GitHub host.
    pub async fn new() -> Self {
        Self::with_github_host("example.com").await
    }

    /// Create a test server whose GitHub endpoints live on `github_host`.
    ///
    /// Pass a loopback `host:port` (see [`StubGitHub`]) to exercise the
    /// full callback flow against a local stand-in provider.
    pub async fn with_github_host(github_host: &str) -> Self {
        // Temporary directory for the test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "127.0.0.1".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            github: config::GitHubConfig {
                host: github_host.to_string(),
                client_id: "abc".to_string(),
                client_secret: "test-client-secret".to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client that does not follow redirects, so tests can
        // assert on Location and Set-Cookie headers directly.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router and spawn server in background
        let app = gatehouse::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            client,
            _temp_dir: temp_dir,
        }
    }

    /// Build a full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

/// A local stand-in for GitHub's OAuth and API endpoints.
///
/// Serves the token exchange and the current-user endpoint on a loopback
/// port. The exchange succeeds only for [`StubGitHub::GOOD_CODE`];
/// anything else gets a `bad_verification_code` error body, mirroring
/// GitHub's 200-with-error behavior.
pub struct StubGitHub {
    /// host:port to use as `github.host`
    pub host: String,
}

impl StubGitHub {
    pub const GOOD_CODE: &'static str = "good-code";

    pub async fn spawn() -> Self {
        use axum::extract::Query;
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use std::collections::HashMap;

        async fn access_token(
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<serde_json::Value> {
            if params.get("code").map(String::as_str) == Some(StubGitHub::GOOD_CODE) {
                Json(serde_json::json!({
                    "access_token": "stub-access-token",
                    "expires_in": 28800,
                }))
            } else {
                Json(serde_json::json!({ "error": "bad_verification_code" }))
            }
        }

        async fn current_user() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "id": 1,
                "login": "alice",
                "avatar_url": "u",
            }))
        }

        let app = Router::new()
            .route("/login/oauth/access_token", post(access_token))
            .route("/api/v3/user", get(current_user));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { host }
    }
}

/// Pull the `session_id` cookie value out of a `Set-Cookie` header.
pub fn session_cookie_value(response: &reqwest::Response) -> Option<String> {
    let set_cookie = response.headers().get("set-cookie")?.to_str().ok()?;
    let pair = set_cookie.split(';').next()?;
    let value = pair.strip_prefix("session_id=")?;
    Some(value.to_string())
}
