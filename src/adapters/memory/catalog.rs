//! In-memory parts catalog.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{CatalogError, Part, PartsCatalog};

/// A fixed parts list searched by token overlap.
///
/// Ranking is by how many query tokens appear in the part name, ties broken
/// by stock (in-stock parts first).
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    parts: Arc<RwLock<Vec<Part>>>,
}

impl InMemoryCatalog {
    /// Creates a catalog with no parts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with the given parts.
    pub fn with_parts(parts: Vec<Part>) -> Self {
        Self {
            parts: Arc::new(RwLock::new(parts)),
        }
    }

    /// Adds a part.
    pub async fn add(&self, part: Part) {
        self.parts.write().await.push(part);
    }

    fn score(query: &str, name: &str) -> usize {
        let name_lower = name.to_lowercase();
        query
            .to_lowercase()
            .split_whitespace()
            .filter(|token| name_lower.contains(token))
            .count()
    }
}

#[async_trait]
impl PartsCatalog for InMemoryCatalog {
    async fn search(&self, query: &str) -> Result<Vec<Part>, CatalogError> {
        let parts = self.parts.read().await;
        let mut hits: Vec<(usize, Part)> = parts
            .iter()
            .map(|part| (Self::score(query, &part.name), part.clone()))
            .filter(|(score, _)| *score > 0)
            .collect();
        hits.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| (b.1.stock_quantity > 0).cmp(&(a.1.stock_quantity > 0)))
        });
        Ok(hits.into_iter().map(|(_, part)| part).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: &str, name: &str, stock: u32) -> Part {
        Part {
            id: id.to_string(),
            name: name.to_string(),
            price: 450,
            bulk_price: Some(400),
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn empty_catalog_returns_no_hits() {
        let catalog = InMemoryCatalog::empty();
        assert!(catalog.search("remote control").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finds_part_by_partial_name() {
        let catalog = InMemoryCatalog::with_parts(vec![
            part("p1", "AC Remote Control", 20),
            part("p2", "Fridge Thermostat", 5),
        ]);

        let hits = catalog.search("remote control").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p1");
    }

    #[tokio::test]
    async fn ranks_fuller_matches_first() {
        let catalog = InMemoryCatalog::with_parts(vec![
            part("p1", "Universal Remote", 20),
            part("p2", "AC Remote Control", 20),
        ]);

        let hits = catalog.search("remote control").await.unwrap();
        assert_eq!(hits[0].id, "p2");
    }

    #[tokio::test]
    async fn in_stock_parts_rank_above_out_of_stock() {
        let catalog = InMemoryCatalog::with_parts(vec![
            part("p1", "AC Remote Control", 0),
            part("p2", "TV Remote Control", 15),
        ]);

        let hits = catalog.search("remote control").await.unwrap();
        assert_eq!(hits[0].id, "p2");
    }
}
