//! Cart Repository

use std::sync::Arc;

use crate::persistence::{Collection, DocumentStore, StoreError};

use super::entity::Cart;

pub struct CartRepository {
    collection: Collection<Cart>,
}

impl CartRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Collection::new(store),
        }
    }

    pub async fn find_by_customer(&self, customer_id: i64) -> Result<Option<Cart>, StoreError> {
        self.collection.find_by_id(customer_id).await
    }

    /// Existing cart, or a new empty one (not yet persisted).
    pub async fn find_or_new(&self, customer_id: i64) -> Result<Cart, StoreError> {
        Ok(self
            .find_by_customer(customer_id)
            .await?
            .unwrap_or_else(|| Cart::new(customer_id)))
    }

    pub async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        self.collection.save(cart).await
    }

    pub async fn delete(&self, customer_id: i64) -> Result<bool, StoreError> {
        self.collection.delete(customer_id).await
    }
}
