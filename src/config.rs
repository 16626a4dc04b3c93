//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "app.example.com" or "127.0.0.1:8080")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for this service
    ///
    /// # Returns
    /// Full URL like "https://app.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }

    /// The redirect URI registered with the OAuth provider.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/api/complete/github", self.base_url())
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// GitHub OAuth application configuration
///
/// `host` is "github.com" for the public service or the instance hostname
/// for GitHub Enterprise. All endpoint URLs are derived from it.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub host: String,
    pub client_id: String,
    pub client_secret: String,
}

impl GitHubConfig {
    /// URL scheme for provider endpoints.
    ///
    /// Loopback hosts get plain HTTP so a local stand-in provider can be
    /// used during development and testing. Everything else is HTTPS.
    fn scheme(&self) -> &'static str {
        if is_local_host(&self.host) { "http" } else { "https" }
    }

    /// OAuth authorization endpoint (where the browser is sent).
    pub fn authorize_endpoint(&self) -> String {
        format!("{}://{}/login/oauth/authorize", self.scheme(), self.host)
    }

    /// OAuth code-exchange endpoint.
    pub fn access_token_endpoint(&self) -> String {
        format!("{}://{}/login/oauth/access_token", self.scheme(), self.host)
    }

    /// REST API base URL.
    ///
    /// github.com has the API on a subdomain. GitHub Enterprise has it on
    /// the same host under /api/v3.
    pub fn api_url(&self) -> String {
        if self.host == "github.com" {
            return "https://api.github.com".to_string();
        }

        format!("{}://{}/api/v3", self.scheme(), self.host)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GATEHOUSE_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.protocol", "http")?
            .set_default("github.host", "github.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (GATEHOUSE_*)
            .add_source(
                Environment::with_prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.github.client_id.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "github.client_id must not be empty".to_string(),
            ));
        }

        if self.github.client_secret.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "github.client_secret must not be empty".to_string(),
            ));
        }

        if !self.server.protocol.eq_ignore_ascii_case("https") {
            if is_local_host(&self.server.domain) {
                tracing::warn!(
                    domain = %self.server.domain,
                    protocol = %self.server.protocol,
                    "Serving over plain HTTP for local development"
                );
            } else {
                return Err(crate::error::AppError::Config(
                    "server.protocol must be https for non-local server domains".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn normalized_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_host(domain: &str) -> bool {
    let host = normalized_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                domain: "localhost:8080".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/gatehouse-test.db"),
            },
            github: GitHubConfig {
                host: "github.com".to_string(),
                client_id: "github-client-id".to_string(),
                client_secret: "github-client-secret".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_http_for_non_local_domain() {
        let mut config = valid_config();
        config.server.domain = "app.example.com".to_string();
        config.server.protocol = "http".to_string();

        let error = config
            .validate()
            .expect_err("public domains must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("server.protocol must be https")
        ));
    }

    #[test]
    fn github_com_api_lives_on_subdomain() {
        let config = valid_config();
        assert_eq!(config.github.api_url(), "https://api.github.com");
        assert_eq!(
            config.github.authorize_endpoint(),
            "https://github.com/login/oauth/authorize"
        );
    }

    #[test]
    fn enterprise_api_lives_on_same_host() {
        let mut config = valid_config();
        config.github.host = "github.corp.example.com".to_string();

        assert_eq!(
            config.github.api_url(),
            "https://github.corp.example.com/api/v3"
        );
        assert_eq!(
            config.github.access_token_endpoint(),
            "https://github.corp.example.com/login/oauth/access_token"
        );
    }

    #[test]
    fn loopback_provider_host_uses_plain_http() {
        let mut config = valid_config();
        config.github.host = "127.0.0.1:9099".to_string();

        assert_eq!(
            config.github.authorize_endpoint(),
            "http://127.0.0.1:9099/login/oauth/authorize"
        );
        assert_eq!(config.github.api_url(), "http://127.0.0.1:9099/api/v3");
    }

    #[test]
    fn callback_url_is_under_base_url() {
        let config = valid_config();
        assert_eq!(
            config.server.oauth_callback_url(),
            "http://localhost:8080/api/complete/github"
        );
    }
}
