//! Vendor-feed integration layer.
//!
//! Normalizes product catalog and inventory feeds from five independent
//! wholesale distributors - REST APIs behind OAuth client-credentials
//! grants, SFTP-delivered CSV extracts, and EDI 832 drops - into one
//! canonical record shape. The [`distributors::DistributorFactory`] is the
//! single entry point: give it a distributor code and a config, get back a
//! protocol client implementing [`distributors::DistributorClient`].
//!
//! This crate owns fetch/parse/normalize primitives and the auth/IO
//! plumbing they need. Pricing rules, inventory reconciliation, and sync
//! scheduling belong to the surrounding system.

pub mod distributors;
pub mod edi;
pub mod error;
pub mod oauth;
pub mod records;
pub mod sftp;
pub mod textfeed;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use distributors::{
    DistributorClient, DistributorCode, DistributorConfig, DistributorFactory, FeedType,
};
pub use error::FeedError;
pub use oauth::{AccessToken, ApiEnvironment, OAuthClient, OAuthConfig};
pub use records::{CanonicalProduct, InventoryLevel};
pub use textfeed::{map_rows, parse_delimited, FieldRule, ParsedTable, Row};
