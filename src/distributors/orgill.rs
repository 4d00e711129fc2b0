//! Orgill SFTP/CSV feed client.
//!
//! Orgill drops fixed-name CSV extracts on an SFTP host. Files flow through
//! the delimited-text parser and an Orgill-specific field mapping into
//! canonical records.

use tracing::info;

use crate::distributors::{required_field, DistributorClient, DistributorCode, DistributorConfig};
use crate::error::FeedError;
use crate::records::{CanonicalProduct, InventoryLevel};
use crate::sftp::{RemoteFileSource, SftpConfig, SftpFileSource};
use crate::textfeed::{map_rows, parse_delimited, parse_price, parse_quantity, FieldRule};

const DEFAULT_CATALOG_PATH: &str = "/outbound/ecomm/catalog_full.csv";
const DEFAULT_INVENTORY_PATH: &str = "/outbound/ecomm/inventory_daily.csv";

pub struct OrgillClient {
    source: Box<dyn RemoteFileSource>,
    catalog_path: String,
    inventory_path: String,
}

impl OrgillClient {
    pub fn new(config: DistributorConfig) -> Result<Self, FeedError> {
        let host = required_field(&config.sftp_host, DistributorCode::Orgill, "sftp_host")?;
        let username =
            required_field(&config.sftp_username, DistributorCode::Orgill, "sftp_username")?;
        let password =
            required_field(&config.sftp_password, DistributorCode::Orgill, "sftp_password")?;

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

/// Orgill catalog extract columns -> canonical product fields.
fn catalog_rules() -> Vec<FieldRule<CanonicalProduct>> {
    vec![
        FieldRule::column("ITEM_NBR", |r, v| r.sku = v),
        FieldRule::column("ITEM_DESC", |r, v| r.name = v),
        FieldRule::compute("price", |r, row| {
            r.price = parse_price(row.get("RETAIL_PRICE").map(String::as_str).unwrap_or_default())?;
            Ok(())
        }),
        FieldRule::compute("quantity", |r, row| {
            r.quantity =
                parse_quantity(row.get("QTY_AVAIL").map(String::as_str).unwrap_or_default())?;
            Ok(())
        }),
        FieldRule::column("UPC_CODE", |r, v| {
            r.upc = if v.is_empty() { None } else { Some(v) }
        }),
        FieldRule::compute("cost", |r, row| {
            // Dealer cost column is optional on older extracts.
            r.cost = match row.get("DEALER_COST").map(String::as_str) {
                Some(raw) if !raw.trim().is_empty() => Some(parse_price(raw)?),
                _ => None,
            };
            Ok(())
        }),
    ]
}

/// Orgill inventory extract columns -> canonical levels.
fn inventory_rules() -> Vec<FieldRule<InventoryLevel>> {
    vec![
        FieldRule::column("ITEM_NBR", |r, v| r.sku = v),
        FieldRule::compute("quantity", |r, row| {
            r.quantity =
                parse_quantity(row.get("QTY_AVAIL").map(String::as_str).unwrap_or_default())?;
            Ok(())
        }),
        FieldRule::compute("price", |r, row| {
            r.price = match row.get("RETAIL_PRICE").map(String::as_str) {
                Some(raw) if !raw.trim().is_empty() => Some(parse_price(raw)?),
                _ => None,
            };
            Ok(())
        }),
    ]
}

#[async_trait::async_trait]
impl DistributorClient for OrgillClient {
    fn code(&self) -> DistributorCode {
        DistributorCode::Orgill
    }

    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError> {
        let text = self.source.fetch_text(&self.catalog_path).await?;
        let table = parse_delimited(&text)?;
        let products = map_rows(&table.rows, &catalog_rules())?;
        info!(
            target = "orgill",
            path = %self.catalog_path,
            rows = table.rows.len(),
            products = products.len(),
            "catalog extract mapped"
        );
        Ok(products)
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError> {
        let text = self.source.fetch_text(&self.inventory_path).await?;
        let table = parse_delimited(&text)?;
        let levels = map_rows(&table.rows, &inventory_rules())?;
        info!(
            target = "orgill",
            path = %self.inventory_path,
            levels = levels.len(),
            "inventory extract mapped"
        );
        Ok(levels)
    }
}
