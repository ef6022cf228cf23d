//! Order Repository

use std::sync::Arc;

use crate::persistence::{Collection, DocumentStore, StoreError};

use super::entity::Order;

pub struct OrderRepository {
    collection: Collection<Order>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Collection::new(store),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Order>, StoreError> {
        self.collection.find_by_id(id).await
    }

    /// A customer's orders, newest first.
    pub async fn find_by_customer(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.collection.find_by("customerId", customer_id).await?;
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    pub async fn save(&self, order: &Order) -> Result<(), StoreError> {
        self.collection.save(order).await
    }
}
