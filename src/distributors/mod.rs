//! Distributor registry: codes, feed types, the shared capability contract,
//! and the factory that turns a code plus config into a protocol client.

pub mod bci;
pub mod central;
pub mod orgill;
pub mod pfx;
pub mod phillips;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FeedError;
use crate::oauth::ApiEnvironment;
use crate::records::{CanonicalProduct, InventoryLevel};
use crate::util::env as env_util;

/// Closed set of supported wholesale distributors. Identity key for adapter
/// selection only; carries no meaning beyond routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributorCode {
    Bci,
    Orgill,
    Phillips,
    Pfx,
    Central,
}

impl DistributorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributorCode::Bci => "BCI",
            DistributorCode::Orgill => "ORGILL",
            DistributorCode::Phillips => "PHILLIPS",
            DistributorCode::Pfx => "PFX",
            DistributorCode::Central => "CENTRAL",
        }
    }
}

impl fmt::Display for DistributorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributorCode {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BCI" => Ok(DistributorCode::Bci),
            "ORGILL" => Ok(DistributorCode::Orgill),
            "PHILLIPS" => Ok(DistributorCode::Phillips),
            "PFX" => Ok(DistributorCode::Pfx),
            "CENTRAL" => Ok(DistributorCode::Central),
            other => Err(FeedError::UnknownDistributor(other.to_string())),
        }
    }
}

/// Transport/encoding family a distributor uses. Fixed per code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedType {
    Rest,
    Sftp,
    Edi,
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedType::Rest => "REST",
            FeedType::Sftp => "SFTP",
            FeedType::Edi => "EDI",
        })
    }
}

/// Per-distributor configuration bag. Constructed by the caller, moved into
/// the adapter at `get_client`, immutable thereafter. Which fields are
/// required depends on the distributor's feed type; adapters validate
/// before any I/O.
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    pub environment: ApiEnvironment,
    /// Override for the REST API base URL (defaults per environment).
    pub api_base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub sftp_host: Option<String>,
    pub sftp_port: u16,
    pub sftp_username: Option<String>,
    pub sftp_password: Option<String>,
    /// Remote path override for the catalog file.
    pub catalog_path: Option<String>,
    /// Remote path override for the inventory file.
    pub inventory_path: Option<String>,
    pub timeout: Duration,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            environment: ApiEnvironment::Production,
            api_base_url: None,
            client_id: None,
            client_secret: None,
            scope: None,
            sftp_host: None,
            sftp_port: 22,
            sftp_username: None,
            sftp_password: None,
            catalog_path: None,
            inventory_path: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DistributorConfig {
    /// Build a config from `FEED_<CODE>_*` environment variables
    /// (e.g. `FEED_BCI_CLIENT_ID`, `FEED_ORGILL_SFTP_HOST`). Only the
    /// fields relevant to the distributor's feed type are read; required
    /// ones are validated again by the adapter constructor.
    pub fn from_env(code: DistributorCode) -> Self {
        env_util::init_env();
        let key = |name: &str| format!("FEED_{}_{name}", code.as_str());
        let get = |name: &str| env_util::env_opt(&key(name));

        let environment = match get("ENVIRONMENT").as_deref() {
            Some("sandbox") | Some("SANDBOX") => ApiEnvironment::Sandbox,
            _ => ApiEnvironment::Production,
        };

        Self {
            environment,
            api_base_url: get("API_BASE_URL"),
            client_id: get("CLIENT_ID"),
            client_secret: get("CLIENT_SECRET"),
            scope: get("SCOPE"),
            sftp_host: get("SFTP_HOST"),
            sftp_port: env_util::env_parse(&key("SFTP_PORT"), 22),
            sftp_username: get("SFTP_USERNAME"),
            sftp_password: get("SFTP_PASSWORD"),
            catalog_path: get("CATALOG_PATH"),
            inventory_path: get("INVENTORY_PATH"),
            timeout: Duration::from_secs(env_util::env_parse(&key("TIMEOUT_SECS"), 30)),
        }
    }
}

/// Pull a required config field or fail before any I/O happens.
pub(crate) fn required_field(
    value: &Option<String>,
    code: DistributorCode,
    field: &str,
) -> Result<String, FeedError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| FeedError::Config(format!("{code}: {field} is required")))
}

/// Capability contract every distributor adapter implements.
#[async_trait]
pub trait DistributorClient: Send + Sync {
    fn code(&self) -> DistributorCode;

    fn feed_type(&self) -> FeedType {
        DistributorFactory::feed_type(self.code())
    }

    /// Fetch the full product catalog as canonical records.
    async fn fetch_catalog(&self) -> Result<Vec<CanonicalProduct>, FeedError>;

    /// Fetch current inventory levels as canonical records.
    async fn fetch_inventory(&self) -> Result<Vec<InventoryLevel>, FeedError>;
}

type BuildFn = fn(DistributorConfig) -> Result<Box<dyn DistributorClient>, FeedError>;

struct RegistryEntry {
    code: DistributorCode,
    build: BuildFn,
}

/// Immutable adapter registry. The order here is the documented support
/// order returned by `supported_distributors` and is part of the public
/// contract - do not alphabetize.
const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        code: DistributorCode::Bci,
        build: |config| Ok(Box::new(bci::BciClient::new(config)?)),
    },
    RegistryEntry {
        code: DistributorCode::Orgill,
        build: |config| Ok(Box::new(orgill::OrgillClient::new(config)?)),
    },
    RegistryEntry {
        code: DistributorCode::Phillips,
        build: |config| Ok(Box::new(phillips::PhillipsClient::new(config)?)),
    },
    RegistryEntry {
        code: DistributorCode::Pfx,
        build: |config| Ok(Box::new(pfx::PfxClient::new(config)?)),
    },
    RegistryEntry {
        code: DistributorCode::Central,
        build: |config| Ok(Box::new(central::CentralClient::new(config)?)),
    },
];

/// Stateless entry point mapping a distributor code to its protocol client.
pub struct DistributorFactory;

impl DistributorFactory {
    /// Construct the adapter for `code`, seeded with `config`. Pure routing:
    /// no fallback adapter exists for unrecognized codes.
    pub fn get_client(
        code: DistributorCode,
        config: DistributorConfig,
    ) -> Result<Box<dyn DistributorClient>, FeedError> {
        let entry = REGISTRY
            .iter()
            .find(|entry| entry.code == code)
            .ok_or_else(|| FeedError::UnknownDistributor(code.to_string()))?;
        (entry.build)(config)
    }

    /// String-keyed variant for callers holding raw codes; fails with an
    /// "Unknown distributor" error for anything outside the supported set.
    pub fn get_client_by_code(
        code: &str,
        config: DistributorConfig,
    ) -> Result<Box<dyn DistributorClient>, FeedError> {
        Self::get_client(code.parse()?, config)
    }

    /// Supported codes in the fixed documented order:
    /// BCI, ORGILL, PHILLIPS, PFX, CENTRAL.
    pub fn supported_distributors() -> Vec<DistributorCode> {
        REGISTRY.iter().map(|entry| entry.code).collect()
    }

    /// Feed type for a code. Total over the closed enum; no fallback.
    pub fn feed_type(code: DistributorCode) -> FeedType {
        match code {
            DistributorCode::Bci | DistributorCode::Phillips => FeedType::Rest,
            DistributorCode::Orgill | DistributorCode::Pfx => FeedType::Sftp,
            DistributorCode::Central => FeedType::Edi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> DistributorConfig {
        DistributorConfig {
            api_base_url: Some("https://api.example.com".to_string()),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            sftp_host: Some("feeds.example.com".to_string()),
            sftp_username: Some("acct".to_string()),
            sftp_password: Some("pw".to_string()),
            ..DistributorConfig::default()
        }
    }

    #[test]
    fn feed_type_mapping_is_fixed() {
        assert_eq!(DistributorFactory::feed_type(DistributorCode::Bci), FeedType::Rest);
        assert_eq!(
            DistributorFactory::feed_type(DistributorCode::Phillips),
            FeedType::Rest
        );
        assert_eq!(
            DistributorFactory::feed_type(DistributorCode::Orgill),
            FeedType::Sftp
        );
        assert_eq!(DistributorFactory::feed_type(DistributorCode::Pfx), FeedType::Sftp);
        assert_eq!(
            DistributorFactory::feed_type(DistributorCode::Central),
            FeedType::Edi
        );
    }

    #[test]
    fn supported_distributors_keep_documented_order() {
        assert_eq!(
            DistributorFactory::supported_distributors(),
            vec![
                DistributorCode::Bci,
                DistributorCode::Orgill,
                DistributorCode::Phillips,
                DistributorCode::Pfx,
                DistributorCode::Central,
            ]
        );
    }

    #[test]
    fn get_client_builds_the_matching_adapter_for_every_code() {
        for code in DistributorFactory::supported_distributors() {
            let client = DistributorFactory::get_client(code, full_config())
                .unwrap_or_else(|e| panic!("{code}: {e}"));
            assert_eq!(client.code(), code);
            assert_eq!(client.feed_type(), DistributorFactory::feed_type(code));
        }
    }

    #[test]
    fn unknown_code_fails_without_fallback() {
        let err =
            DistributorFactory::get_client_by_code("UNKNOWN", DistributorConfig::default())
                .map(|_| ())
                .unwrap_err();
        assert!(err.to_string().contains("Unknown distributor"));
    }

    #[test]
    fn code_round_trips_through_strings() {
        for code in DistributorFactory::supported_distributors() {
            let parsed: DistributorCode = code.as_str().parse().unwrap();
            assert_eq!(parsed, code);
        }
        // Parsing is case-insensitive for operator convenience.
        assert_eq!(
            "orgill".parse::<DistributorCode>().unwrap(),
            DistributorCode::Orgill
        );
    }

    #[test]
    fn from_env_reads_prefixed_variables() {
        // CENTRAL-prefixed keys are touched only by this test, so parallel
        // test execution cannot race on them.
        std::env::set_var("FEED_CENTRAL_SFTP_HOST", "edi.centralexample.com");
        std::env::set_var("FEED_CENTRAL_SFTP_PORT", "2222");
        std::env::set_var("FEED_CENTRAL_TIMEOUT_SECS", "45");
        std::env::set_var("FEED_CENTRAL_ENVIRONMENT", "sandbox");

        let config = DistributorConfig::from_env(DistributorCode::Central);
        assert_eq!(config.sftp_host.as_deref(), Some("edi.centralexample.com"));
        assert_eq!(config.sftp_port, 2222);
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.environment, ApiEnvironment::Sandbox);
        // Unset fields stay None; a garbled port falls back to the default.
        assert_eq!(config.client_id, None);
        std::env::set_var("FEED_CENTRAL_SFTP_PORT", "not-a-port");
        let config = DistributorConfig::from_env(DistributorCode::Central);
        assert_eq!(config.sftp_port, 22);

        for key in [
            "FEED_CENTRAL_SFTP_HOST",
            "FEED_CENTRAL_SFTP_PORT",
            "FEED_CENTRAL_TIMEOUT_SECS",
            "FEED_CENTRAL_ENVIRONMENT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_required_config_fails_before_io() {
        let err = DistributorFactory::get_client(
            DistributorCode::Bci,
            DistributorConfig::default(),
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));

        let err = DistributorFactory::get_client(
            DistributorCode::Orgill,
            DistributorConfig::default(),
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }
}
