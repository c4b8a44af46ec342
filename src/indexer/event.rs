//! Transport snapshots sent to the search-indexing service.
//!
//! Each persisted product or shop update produces exactly one event, created
//! from the stored row, handed to the dispatcher and then discarded.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::models::{Product, Shop};

/// Named destination on the index channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDestination {
    Products,
    Shops,
}

impl IndexDestination {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexDestination::Products => "products",
            IndexDestination::Shops => "shops",
        }
    }
}

/// Operation tag carried by every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOperation {
    Index,
}

/// Public fields of a product as the index service consumes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub id: i32,
    pub shop_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub trending_score: i64,
}

impl From<&Product> for ProductDocument {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            shop_id: product.shop_id,
            name: product.name.clone(),
            price: product.price.clone(),
            trending_score: product.trending_score,
        }
    }
}

/// Public fields of a shop as the index service consumes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopDocument {
    pub id: i32,
    pub name: String,
    pub trending_score: i64,
}

impl From<&Shop> for ShopDocument {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            trending_score: shop.trending_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexDocument {
    Product(ProductDocument),
    Shop(ShopDocument),
}

/// One "index this" message for the search-indexing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEvent {
    pub destination: IndexDestination,
    pub operation: IndexOperation,
    pub document: IndexDocument,
}

impl IndexEvent {
    /// Snapshot of a freshly persisted product.
    pub fn product(product: &Product) -> Self {
        Self {
            destination: IndexDestination::Products,
            operation: IndexOperation::Index,
            document: IndexDocument::Product(ProductDocument::from(product)),
        }
    }

    /// Snapshot of a freshly persisted shop.
    pub fn shop(shop: &Shop) -> Self {
        Self {
            destination: IndexDestination::Shops,
            operation: IndexOperation::Index,
            document: IndexDocument::Shop(ShopDocument::from(shop)),
        }
    }
}
