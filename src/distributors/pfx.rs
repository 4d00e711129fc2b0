//! PFX SFTP/CSV feed client.
//!
//! Same retrieval path as Orgill but PFX ships lower-case headers, a
//! combined price/availability extract, and per-case pack quantities that
//! fold into the unit quantity.

use tracing::info;

use crate::distributors::{required_field, DistributorClient, DistributorCode, DistributorConfig};
use crate::error::FeedError;
use crate::records::{CanonicalProduct, InventoryLevel};
use crate::sftp::{RemoteFileSource, SftpConfig, SftpFileSource};
use crate::textfeed::{map_rows, parse_delimited, parse_price, parse_quantity, FieldRule, Row};

const DEFAULT_CATALOG_PATH: &str = "/export/pfx_item_master.csv";
const DEFAULT_INVENTORY_PATH: &str = "/export/pfx_stock_status.csv";

pub struct PfxClient {
    source: Box<dyn RemoteFileSource>,
    catalog_path: String,
    inventory_path: String,
}

impl PfxClient {
    pub fn new(config: DistributorConfig) -> Result<Self, FeedError> {
        let host = required_field(&config.sftp_host, DistributorCode::Pfx, "sftp_host")?;
        let username =
            required_field(&config.sftp_username, DistributorCode::Pfx, "sftp_username")?;
        let password =
            required_field(&config.sftp_password, DistributorCode::Pfx, "sftp_password")?;

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

/// Quantity arrives as cases on hand times units per case; a blank pack
/// size means the case is the unit.
fn case_units(row: &Row) -> Result<i64, FeedError> {
    let cases =
        parse_quantity(row.get("cases_on_hand").map(String::as_str).unwrap_or_default())?;
    let per_case =
        parse_quantity(row.get("units_per_case").map(String::as_str).unwrap_or_default())?;
    cases.checked_mul(per_case.max(1)).ok_or_else(|| {
        FeedError::Map(format!(
            "case quantity overflow: {cases} cases x {per_case} per case"
        ))
    })
}

fn catalog_rules() -> Vec<FieldRule<CanonicalProduct>> {
    vec![
        FieldRule::column("item_id", |r, v| r.sku = v),
        FieldRule::column("item_description", |r, v| r.name = v),
        FieldRule::compute("price", |r, row| {
            r.price = parse_price(row.get("your_price").map(String::as_str).unwrap_or_default())?;
            Ok(())
        }),
        FieldRule::compute("quantity", |r, row| {
            r.quantity = case_units(row)?;
            Ok(())
        }),
        FieldRule::column("upc", |r, v| {
            r.upc = if v.is_empty() { None } else { Some(v) }
        }),
    ]
}

fn inventory_rules() -> Vec<FieldRule<InventoryLevel>> {
    vec![
        FieldRule::column("item_id", |r, v| r.sku = v),
        FieldRule::compute("quantity", |r, row| {
            r.quantity = case_units(row)?;
            Ok(())
        }),
        FieldRule::compute("price", |r, row| {
            r.price = match row.get("your_price").map(String::as_str) {
                Some(raw) if !raw.trim().is_empty() => Some(parse_price(raw)?),
                _ => None,
            };
            Ok(())
        }),
    ]
}

#[async_trait::async_trait]
impl DistributorClient for PfxClient {
    fn code(&self) -> DistributorCode {
        DistributorCode::Pfx
    }

    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError> {
        let text = self.source.fetch_text(&self.catalog_path).await?;
        let table = parse_delimited(&text)?;
        let products = map_rows(&table.rows, &catalog_rules())?;
        info!(
            target = "pfx",
            path = %self.catalog_path,
            products = products.len(),
            "item master mapped"
        );
        Ok(products)
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError> {
        let text = self.source.fetch_text(&self.inventory_path).await?;
        let table = parse_delimited(&text)?;
        let levels = map_rows(&table.rows, &inventory_rules())?;
        info!(
            target = "pfx",
            path = %self.inventory_path,
            levels = levels.len(),
            "stock status mapped"
        );
        Ok(levels)
    }
}
