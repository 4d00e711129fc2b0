//! BCI REST feed client.
//!
//! BCI exposes catalog and inventory as JSON over a bearer-authenticated
//! API. Tokens come from an owned OAuth client-credentials manager; on a
//! 401 the cached token is dropped and the call retried exactly once with a
//! fresh token before the failure surfaces.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::distributors::{required_field, DistributorClient, DistributorCode, DistributorConfig};
use crate::error::FeedError;
use crate::oauth::{ApiEnvironment, OAuthClient, OAuthConfig};
use crate::records::{CanonicalProduct, InventoryLevel};

const PROD_BASE_URL: &str = "https://api.bcidistribution.com";
const SANDBOX_BASE_URL: &str = "https://sandbox.api.bcidistribution.com";
const TOKEN_PATH: &str = "/oauth2/token";
const CATALOG_PATH: &str = "/api/v2/catalog/items";
const INVENTORY_PATH: &str = "/api/v2/inventory/levels";

pub struct BciClient {
    base_url: String,
    http: Client,
    oauth: OAuthClient,
}

#[derive(Debug, Deserialize)]
struct BciItemsPage<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BciCatalogItem {
    item_number: String,
    description: String,
    unit_price: f64,
    #[serde(default)]
    qty_available: i64,
    #[serde(default)]
    upc: Option<String>,
    #[serde(default)]
    dealer_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BciInventoryItem {
    item_number: String,
    #[serde(default)]
    qty_available: i64,
    #[serde(default)]
    unit_price: Option<f64>,
}

impl BciClient {
    pub fn new(config: DistributorConfig) -> Result<Self, FeedError> {
        let client_id = required_field(&config.client_id, DistributorCode::Bci, "client_id")?;
        let client_secret =
            required_field(&config.client_secret, DistributorCode::Bci, "client_secret")?;

        let base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| match config.environment {
                ApiEnvironment::Production => PROD_BASE_URL.to_string(),
                ApiEnvironment::Sandbox => SANDBOX_BASE_URL.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        let oauth = OAuthClient::new(
            OAuthConfig::new(format!("{base_url}{TOKEN_PATH}"), client_id, client_secret)
                .with_scope(config.scope.clone())
                .with_timeout(config.timeout),
        )?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url,
            http,
            oauth,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
        let url = format!("{}{path}", self.base_url);

        let token = self.oauth.get_access_token().await?;
        let mut response = self
            .http
            .get(&url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(target = "bci", %url, "401 with cached token; refreshing once");
            self.oauth.clear_cache().await;
            let token = self.oauth.get_access_token().await?;
            response = self
                .http
                .get(&url)
                .bearer_auth(&token.access_token)
                .send()
                .await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Auth {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Transport(format!(
                "BCI {path} returned HTTP {status}: {body}"
            )));
        }

        debug!(target = "bci", %url, "feed page fetched");
        response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("BCI {path}: invalid JSON payload: {e}")))
    }
}

#[async_trait::async_trait]
impl DistributorClient for BciClient {
    fn code(&self) -> DistributorCode {
        DistributorCode::Bci
    }

    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError> {
        let page: BciItemsPage<BciCatalogItem> = self.get_json(CATALOG_PATH).await?;
        let products = page
            .items
            .into_iter()
            .map(|item| CanonicalProduct {
                sku: item.item_number,
                name: item.description,
                price: item.unit_price,
                quantity: item.qty_available,
                upc: item.upc.filter(|u| !u.is_empty()),
                cost: item.dealer_price,
                description: None,
            })
            .collect::<Vec<_>>();
        info!(target = "bci", products = products.len(), "catalog fetched");
        Ok(products)
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError> {
        let page: BciItemsPage<BciInventoryItem> = self.get_json(INVENTORY_PATH).await?;
        let levels = page
            .items
            .into_iter()
            .map(|item| InventoryLevel {
                sku: item.item_number,
                quantity: item.qty_available,
                price: item.unit_price,
            })
            .collect::<Vec<_>>();
        info!(target = "bci", levels = levels.len(), "inventory fetched");
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> DistributorConfig {
        DistributorConfig {
            api_base_url: Some(server.uri()),
            client_id: Some("bci-id".to_string()),
            client_secret: Some("bci-secret".to_string()),
            ..DistributorConfig::default()
        }
    }

    async fn mount_token(server: &MockServer, token: &str, expect: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(expect)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn catalog_is_fetched_with_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-bci", 1).await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .and(header("authorization", "Bearer tok-bci"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "itemNumber": "BCI-100",
                        "description": "Door Hinge 3in",
                        "unitPrice": 4.75,
                        "qtyAvailable": 320,
                        "upc": "036000291452",
                        "dealerPrice": 2.90
                    },
                    {
                        "itemNumber": "BCI-200",
                        "description": "Cabinet Pull",
                        "unitPrice": 1.99
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BciClient::new(config_for(&server)).unwrap();
        let products = client.fetch_catalog().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku, "BCI-100");
        assert_eq!(products[0].price, 4.75);
        assert_eq!(products[0].cost, Some(2.90));
        assert_eq!(products[1].quantity, 0);
        assert_eq!(products[1].upc, None);
    }

    #[tokio::test]
    async fn stale_token_is_refreshed_once_on_401() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-bci", 2).await;
        Mock::given(method("GET"))
            .and(path(INVENTORY_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(INVENTORY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"itemNumber": "BCI-100", "qtyAvailable": 12}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BciClient::new(config_for(&server)).unwrap();
        let levels = client.fetch_inventory().await.unwrap();
        assert_eq!(levels[0].quantity, 12);
    }

    #[tokio::test]
    async fn persistent_401_surfaces_as_auth_failure() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-bci", 2).await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
            .expect(2)
            .mount(&server)
            .await;

        let client = BciClient::new(config_for(&server)).unwrap();
        let err = client.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, FeedError::Auth { status: 401, .. }), "got: {err}");
    }

    #[tokio::test]
    async fn server_error_is_a_transport_failure() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-bci", 1).await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = BciClient::new(config_for(&server)).unwrap();
        let err = client.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)), "got: {err}");
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn missing_credentials_fail_before_io() {
        let err = BciClient::new(DistributorConfig::default()).map(|_| ()).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
        assert!(err.to_string().contains("client_id"));
    }
}
