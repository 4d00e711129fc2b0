//! Phillips REST feed client.
//!
//! Same bearer-token lifecycle as BCI (owned OAuth manager, single 401
//! refresh-and-retry) but a different API shape: Phillips wraps records in a
//! `products` array and requires an explicit feed scope on the grant.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::distributors::{required_field, DistributorClient, DistributorCode, DistributorConfig};
use crate::error::FeedError;
use crate::oauth::{ApiEnvironment, OAuthClient, OAuthConfig};
use crate::records::{CanonicalProduct, InventoryLevel};

const PROD_BASE_URL: &str = "https://api.phillipspet.com";
const SANDBOX_BASE_URL: &str = "https://api-uat.phillipspet.com";
const TOKEN_PATH: &str = "/connect/token";
const CATALOG_PATH: &str = "/feeds/v1/products";
const INVENTORY_PATH: &str = "/feeds/v1/availability";

/// Scope granted to feed integrations unless the config overrides it.
const DEFAULT_SCOPE: &str = "feeds.read";

pub struct PhillipsClient {
    base_url: String,
    http: Client,
    oauth: OAuthClient,
}

#[derive(Debug, Deserialize)]
struct PhillipsPage<T> {
    products: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhillipsProduct {
    sku: String,
    product_name: String,
    list_price: f64,
    #[serde(default)]
    quantity_on_hand: i64,
    #[serde(default)]
    upc_code: Option<String>,
    #[serde(default)]
    wholesale_price: Option<f64>,
    #[serde(default)]
    long_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhillipsAvailability {
    sku: String,
    #[serde(default)]
    quantity_on_hand: i64,
    #[serde(default)]
    list_price: Option<f64>,
}

impl PhillipsClient {
    pub fn new(config: DistributorConfig) -> Result<Self, FeedError> {
        let client_id = required_field(&config.client_id, DistributorCode::Phillips, "client_id")?;
        let client_secret = required_field(
            &config.client_secret,
            DistributorCode::Phillips,
            "client_secret",
        )?;

        let base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| match config.environment {
                ApiEnvironment::Production => PROD_BASE_URL.to_string(),
                ApiEnvironment::Sandbox => SANDBOX_BASE_URL.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        let scope = config
            .scope
            .clone()
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let oauth = OAuthClient::new(
            OAuthConfig::new(format!("{base_url}{TOKEN_PATH}"), client_id, client_secret)
                .with_scope(Some(scope))
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
            warn!(target = "phillips", %url, "401 with cached token; refreshing once");
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
                "Phillips {path} returned HTTP {status}: {body}"
            )));
        }

        debug!(target = "phillips", %url, "feed page fetched");
        response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("Phillips {path}: invalid JSON payload: {e}")))
    }
}

#[async_trait::async_trait]
impl DistributorClient for PhillipsClient {
    fn code(&self) -> DistributorCode {
        DistributorCode::Phillips
    }

    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError> {
        let page: PhillipsPage<PhillipsProduct> = self.get_json(CATALOG_PATH).await?;
        let products = page
            .products
            .into_iter()
            .map(|p| CanonicalProduct {
                sku: p.sku,
                name: p.product_name,
                price: p.list_price,
                quantity: p.quantity_on_hand,
                upc: p.upc_code.filter(|u| !u.is_empty()),
                cost: p.wholesale_price,
                description: p.long_description.filter(|d| !d.is_empty()),
            })
            .collect::<Vec<_>>();
        info!(target = "phillips", products = products.len(), "catalog fetched");
        Ok(products)
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError> {
        let page: PhillipsPage<PhillipsAvailability> = self.get_json(INVENTORY_PATH).await?;
        let levels = page
            .products
            .into_iter()
            .map(|p| InventoryLevel {
                sku: p.sku,
                quantity: p.quantity_on_hand,
                price: p.list_price,
            })
            .collect::<Vec<_>>();
        info!(target = "phillips", levels = levels.len(), "inventory fetched");
        Ok(levels)
    }
}
