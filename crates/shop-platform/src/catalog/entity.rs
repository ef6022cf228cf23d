//! Catalog Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::TsidGenerator;

use crate::persistence::Entity;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::next_id(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>, description: Option<String>) {
        self.name = name.into();
        self.description = description;
        self.updated_at = Utc::now();
    }
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in cents
    pub price_cents: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        category_id: i64,
        name: impl Into<String>,
        description: Option<String>,
        price_cents: i64,
        stock: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::next_id(),
            category_id,
            name: name.into(),
            description,
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a stock change. Returns `false`, leaving stock untouched, when
    /// the result would be negative.
    pub fn adjust_stock(&mut self, delta: i64) -> bool {
        match self.stock.checked_add(delta) {
            Some(stock) if stock >= 0 => {
                self.stock = stock;
                self.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Category as returned to callers (and cached).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Product with its category name embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub category_id: String,
    pub category_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductDto {
    pub fn new(product: Product, category_name: Option<String>) -> Self {
        Self {
            id: product.id.to_string(),
            category_id: product.category_id.to_string(),
            category_name,
            name: product.name,
            description: product.description,
            price_cents: product.price_cents,
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_stock_never_goes_negative() {
        let mut product = Product::new(1, "Lamp", None, 1999, 3);
        assert!(product.adjust_stock(-3));
        assert_eq!(product.stock, 0);
        assert!(!product.adjust_stock(-1));
        assert_eq!(product.stock, 0);
        assert!(product.adjust_stock(5));
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn test_serialized_field_names() {
        let product = Product::new(7, "Lamp", None, 1999, 3);
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["categoryId"], 7);
        assert_eq!(json["priceCents"], 1999);
    }
}
