//! Catalog Repositories

use std::sync::Arc;

use crate::persistence::{Collection, DocumentStore, StoreError};

use super::entity::{Category, Product};

pub struct CategoryRepository {
    collection: Collection<Category>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Collection::new(store),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        self.collection.find_by_id(id).await
    }

    /// All categories sorted by name.
    pub async fn find_all(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.collection.find_all().await?;
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    /// Case-insensitive name lookup.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let name = name.trim().to_lowercase();
        Ok(self
            .collection
            .find_all()
            .await?
            .into_iter()
            .find(|c| c.name.to_lowercase() == name))
    }

    pub async fn save(&self, category: &Category) -> Result<(), StoreError> {
        self.collection.save(category).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.collection.delete(id).await
    }
}

pub struct ProductRepository {
    collection: Collection<Product>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Collection::new(store),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        self.collection.find_by_id(id).await
    }

    /// All products sorted by name.
    pub async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let mut products = self.collection.find_all().await?;
        products.sort_by_key(|p| p.name.to_lowercase());
        Ok(products)
    }

    pub async fn find_by_category(&self, category_id: i64) -> Result<Vec<Product>, StoreError> {
        let mut products = self.collection.find_by("categoryId", category_id).await?;
        products.sort_by_key(|p| p.name.to_lowercase());
        Ok(products)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let name = name.trim().to_lowercase();
        Ok(self
            .collection
            .find_all()
            .await?
            .into_iter()
            .find(|p| p.name.to_lowercase() == name))
    }

    pub async fn save(&self, product: &Product) -> Result<(), StoreError> {
        self.collection.save(product).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.collection.delete(id).await
    }
}
