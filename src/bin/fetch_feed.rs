//! Fetch one distributor feed and print canonical records.
//!
//! Credentials and connection details come from `FEED_<CODE>_*` environment
//! variables (see `DistributorConfig::from_env`), loaded via `.env` when
//! present. Examples:
//!
//! ```text
//! fetch_feed BCI catalog --json
//! fetch_feed ORGILL inventory
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use distributor_feeds::util::env as env_util;
use distributor_feeds::{DistributorCode, DistributorConfig, DistributorFactory};
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Feed {
    Catalog,
    Inventory,
}

#[derive(Debug, Parser)]
#[command(
    name = "fetch_feed",
    about = "Fetch a distributor catalog or inventory feed as canonical records"
)]
struct Args {
    /// Distributor code: BCI, ORGILL, PHILLIPS, PFX, or CENTRAL
    distributor: String,

    /// Which feed to fetch
    #[arg(value_enum, default_value = "catalog")]
    feed: Feed,

    /// Emit records as JSON lines instead of a summary
    #[arg(long)]
    json: bool,

    /// List supported distributors and their feed types, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    distributor_feeds::tracing::init_tracing("info")?;
    let args = Args::parse();

    if args.list {
        for code in DistributorFactory::supported_distributors() {
            println!("{code}\t{}", DistributorFactory::feed_type(code));
        }
        return Ok(());
    }

    let code: DistributorCode = args.distributor.parse()?;
    let config = DistributorConfig::from_env(code);
    let client = DistributorFactory::get_client(code, config)
        .with_context(|| format!("failed to construct {code} client"))?;

    match args.feed {
        Feed::Catalog => {
            let products = client.fetch_catalog().await?;
            info!(distributor = %code, products = products.len(), "catalog fetched");
            if args.json {
                for product in &products {
                    println!("{}", serde_json::to_string(product)?);
                }
            } else {
                println!("{code}: {} catalog records", products.len());
                for product in products.iter().take(10) {
                    println!(
                        "  {}  {:<40}  {:>8.2}  qty {}",
                        product.sku, product.name, product.price, product.quantity
                    );
                }
                if products.len() > 10 {
                    println!("  ... {} more", products.len() - 10);
                }
            }
        }
        Feed::Inventory => {
            let levels = client.fetch_inventory().await?;
            info!(distributor = %code, levels = levels.len(), "inventory fetched");
            if args.json {
                for level in &levels {
                    println!("{}", serde_json::to_string(level)?);
                }
            } else {
                println!("{code}: {} inventory records", levels.len());
                for level in levels.iter().take(10) {
                    println!("  {}  qty {}", level.sku, level.quantity);
                }
                if levels.len() > 10 {
                    println!("  ... {} more", levels.len() - 10);
                }
            }
        }
    }

    Ok(())
}
