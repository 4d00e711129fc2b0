//! Central EDI feed client.
//!
//! Central delivers an EDI 832 price/sales catalog to the same kind of SFTP
//! drop box the CSV distributors use; only the raw decoding step differs.
//! Both fetch operations terminate at the shared canonical record shapes.

use tracing::info;

use crate::distributors::{required_field, DistributorClient, DistributorCode, DistributorConfig};
use crate::edi;
use crate::error::FeedError;
use crate::records::{CanonicalProduct, InventoryLevel};
use crate::sftp::{RemoteFileSource, SftpConfig, SftpFileSource};

const DEFAULT_CATALOG_PATH: &str = "/edi/out/832_catalog.edi";
const DEFAULT_INVENTORY_PATH: &str = "/edi/out/832_stock.edi";

pub struct CentralClient {
    source: Box<dyn RemoteFileSource>,
    catalog_path: String,
    inventory_path: String,
}

impl CentralClient {
    pub fn new(config: DistributorConfig) -> Result<Self, FeedError> {
        let host = required_field(&config.sftp_host, DistributorCode::Central, "sftp_host")?;
        let username =
            required_field(&config.sftp_username, DistributorCode::Central, "sftp_username")?;
        let password =
            required_field(&config.sftp_password, DistributorCode::Central, "sftp_password")?;

        let source = Box::new(SftpFileSource::new(SftpConfig {
            host,
            port: config.sftp_port,
            username,
            password,
            timeout: config.timeout,
        }));
        Ok(Self::from_source(source, &config))
    }

    fn from_source(source: Box<dyn RemoteFileSource>, config: &DistributorConfig) -> Self {
        Self {
            source,
            catalog_path: config
                .catalog_path
                .clone()
                .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string()),
            inventory_path: config
                .inventory_path
                .clone()
                .unwrap_or_else(|| DEFAULT_INVENTORY_PATH.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl DistributorClient for CentralClient {
    fn code(&self) -> DistributorCode {
        DistributorCode::Central
    }

    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError> {
        let payload = self.source.fetch_text(&self.catalog_path).await?;
        let products = edi::decode_catalog(&payload)?;
        info!(
            target = "central",
            path = %self.catalog_path,
            products = products.len(),
            "832 catalog decoded"
        );
        Ok(products)
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError> {
        let payload = self.source.fetch_text(&self.inventory_path).await?;
        let levels: Vec<InventoryLevel> = edi::decode_catalog(&payload)?
            .into_iter()
            .map(|p| InventoryLevel {
                sku: p.sku,
                quantity: p.quantity,
                price: Some(p.price),
            })
            .collect();
        info!(
            target = "central",
            path = %self.inventory_path,
            levels = levels.len(),
            "832 stock decoded"
        );
        Ok(levels)
    }
}
