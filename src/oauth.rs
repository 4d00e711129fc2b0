//! OAuth 2.0 client-credentials token manager with expiry-aware caching.
//!
//! Used by the REST distributor clients. Each `OAuthClient` owns exactly one
//! cached token; instances never share a cache, even with identical
//! credentials. The cache lives behind an async mutex held across the token
//! request, so concurrent callers on one instance coalesce into a single
//! in-flight fetch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::error::FeedError;

/// Which of a distributor's API environments to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnvironment {
    #[default]
    Production,
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    pub timeout: Duration,
}

impl OAuthConfig {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: None,
            timeout: Duration::from_secs(15),
        }
    }

    /// Select the production or sandbox token endpoint by an explicit
    /// environment flag.
    pub fn for_environment(
        environment: ApiEnvironment,
        production_url: &str,
        sandbox_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let token_url = match environment {
            ApiEnvironment::Production => production_url,
            ApiEnvironment::Sandbox => sandbox_url,
        };
        Self::new(token_url, client_id, client_secret)
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A bearer token as handed to callers. Expiry bookkeeping stays inside the
/// client.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    token_type: String,
}

pub struct OAuthClient {
    config: OAuthConfig,
    http: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self, FeedError> {
        if config.client_id.trim().is_empty() {
            return Err(FeedError::Config("oauth client_id is required".to_string()));
        }
        if config.client_secret.trim().is_empty() {
            return Err(FeedError::Config(
                "oauth client_secret is required".to_string(),
            ));
        }
        Url::parse(&config.token_url)
            .map_err(|e| FeedError::Config(format!("invalid token url {:?}: {e}", config.token_url)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            config,
            http,
            cache: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, fetching one only when the cache is
    /// empty or expired. A cache hit issues no network request.
    pub async fn get_access_token(&self) -> Result<AccessToken, FeedError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if Utc::now() < cached.expires_at {
                debug!(
                    target = "oauth",
                    token_url = %self.config.token_url,
                    "token cache hit"
                );
                return Ok(cached.token.clone());
            }
            debug!(target = "oauth", "cached token expired; refetching");
        }

        // A failed fetch leaves the cache in its prior state.
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    /// Unconditionally discard the cached token. The next
    /// `get_access_token` call always performs a fresh network request.
    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken, FeedError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(scope) = self.config.scope.as_deref() {
            params.push(("scope", scope));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let received_at = Utc::now();
        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("invalid token response: {e}")))?;

        info!(
            target = "oauth",
            token_type = %payload.token_type,
            expires_in = payload.expires_in,
            "token acquired"
        );

        Ok(CachedToken {
            token: AccessToken {
                access_token: payload.access_token,
                token_type: payload.token_type,
            },
            expires_at: received_at + chrono::Duration::seconds(payload.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body(expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": "tok-abc",
            "token_type": "Bearer",
            "expires_in": expires_in,
        })
    }

    async fn client_for(server: &MockServer) -> OAuthClient {
        let config = OAuthConfig::new(format!("{}/token", server.uri()), "id-1", "secret-1")
            .with_scope(Some("inventory.read".to_string()));
        OAuthClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn second_call_before_expiry_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let first = client.get_access_token().await.unwrap();
        let second = client.get_access_token().await.unwrap();
        assert_eq!(first.access_token, "tok-abc");
        assert_eq!(second.token_type, "Bearer");
    }

    #[tokio::test]
    async fn clear_cache_forces_a_fresh_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.get_access_token().await.unwrap();
        client.clear_cache().await;
        client.get_access_token().await.unwrap();
    }

    #[tokio::test]
    async fn expired_token_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(0)))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.get_access_token().await.unwrap();
        // expires_in=0 means the token is already stale on the next check.
        client.get_access_token().await.unwrap();
    }

    #[tokio::test]
    async fn non_success_response_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_access_token().await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("401"), "got: {text}");
        assert!(text.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn request_body_carries_grant_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=id-1"))
            .and(body_string_contains("client_secret=secret-1"))
            .and(body_string_contains("scope=inventory.read"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.get_access_token().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_calls_coalesce_into_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let (a, b) = tokio::join!(client.get_access_token(), client.get_access_token());
        assert!(a.is_ok() && b.is_ok());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_usable_after_recovery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.get_access_token().await.is_err());
        assert!(client.get_access_token().await.is_ok());
    }

    #[test]
    fn config_validation_rejects_blank_credentials() {
        let err = OAuthClient::new(OAuthConfig::new("https://example.com/token", "", "s"))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));

        let err = OAuthClient::new(OAuthConfig::new("not a url", "id", "secret"))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn environment_selection_defaults_to_production() {
        let cfg = OAuthConfig::for_environment(
            ApiEnvironment::default(),
            "https://prod.example.com/token",
            "https://sandbox.example.com/token",
            "id",
            "secret",
        );
        assert_eq!(cfg.token_url, "https://prod.example.com/token");

        let cfg = OAuthConfig::for_environment(
            ApiEnvironment::Sandbox,
            "https://prod.example.com/token",
            "https://sandbox.example.com/token",
            "id",
            "secret",
        );
        assert_eq!(cfg.token_url, "https://sandbox.example.com/token");
    }
}
