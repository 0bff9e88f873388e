//! Parts catalog port.
//!
//! Read-only search over the spare-parts inventory. Results are ranked by
//! relevance; the bulk-order flow only ever acts on the first hit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A catalog entry. Prices are whole rupees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub price: u32,
    /// Discounted unit price for bulk quantities, when offered.
    pub bulk_price: Option<u32>,
    pub stock_quantity: u32,
}

/// Port for spare-parts catalog search.
#[async_trait]
pub trait PartsCatalog: Send + Sync {
    /// Searches the catalog, best match first.
    ///
    /// An empty result is a normal outcome, not an error.
    async fn search(&self, query: &str) -> Result<Vec<Part>, CatalogError>;
}

/// Catalog port errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Backing store unreachable.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// Query rejected by the backend.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
