//! Canonical record shapes every distributor adapter converges to.
//!
//! These are created fresh per fetch call and never persisted by this layer;
//! downstream commerce logic owns storage and reconciliation.

use serde::{Deserialize, Serialize};

/// Normalized product record, independent of source feed type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Distributor item identifier (SKU).
    pub sku: String,
    /// Display name / short description.
    pub name: String,
    /// Unit price in the distributor's currency, major units.
    pub price: f64,
    /// Quantity available at the distributor.
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    /// Wholesale cost when the feed exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Normalized inventory snapshot for one SKU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub sku: String,
    pub quantity: i64,
    /// Current price when the inventory feed carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}
