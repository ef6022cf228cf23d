use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::transaction::current_transaction;
use super::{DocumentStore, Entity, StoreError, Transaction};

enum Target<'a> {
    Tx(Arc<dyn Transaction>),
    Store(&'a dyn DocumentStore),
}

/// Typed access to one collection.
pub struct Collection<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    fn target(&self) -> Target<'_> {
        match current_transaction() {
            Some(tx) => Target::Tx(tx),
            None => Target::Store(self.store.as_ref()),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<T>, StoreError> {
        let document = match self.target() {
            Target::Tx(tx) => tx.get(T::COLLECTION, id).await?,
            Target::Store(store) => store.get(T::COLLECTION, id).await?,
        };
        document.map(decode).transpose()
    }

    pub async fn find_by<V: Serialize>(&self, field: &str, value: V) -> Result<Vec<T>, StoreError> {
        let value = serde_json::to_value(value)?;
        let documents = match self.target() {
            Target::Tx(tx) => tx.find_by_field(T::COLLECTION, field, &value).await?,
            Target::Store(store) => store.find_by_field(T::COLLECTION, field, &value).await?,
        };
        documents.into_iter().map(decode).collect()
    }

    pub async fn find_all(&self) -> Result<Vec<T>, StoreError> {
        let documents = match self.target() {
            Target::Tx(tx) => tx.find_all(T::COLLECTION).await?,
            Target::Store(store) => store.find_all(T::COLLECTION).await?,
        };
        documents.into_iter().map(decode).collect()
    }

    /// Insert or replace the entity.
    pub async fn save(&self, entity: &T) -> Result<(), StoreError> {
        let document = serde_json::to_value(entity)?;
        match self.target() {
            Target::Tx(tx) => tx.upsert(T::COLLECTION, entity.id(), document).await,
            Target::Store(store) => store.upsert(T::COLLECTION, entity.id(), document).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        match self.target() {
            Target::Tx(tx) => tx.delete(T::COLLECTION, id).await,
            Target::Store(store) => store.delete(T::COLLECTION, id).await,
        }
    }
}

fn decode<T: Entity>(document: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}
