//! Persistence
//!
//! Document storage behind the aggregates' repositories plus the unit of work
//! that wraps transactional requests.
//!
//! Repositories never receive a transaction handle. `Collection<T>` looks up
//! the transaction opened by the unit of work for the current task and routes
//! every read and write through it; outside a unit of work it talks to the
//! store directly.

mod collection;
mod memory;
mod mongo;
mod transaction;
mod unit_of_work;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use self::collection::Collection;
pub use self::memory::{MemoryDocumentStore, MemoryTransaction};
pub use self::mongo::{MongoDocumentStore, MongoTransaction};
pub use self::transaction::{current_transaction, in_transaction, with_transaction};
pub use self::unit_of_work::{RetryPolicy, StoreUnitOfWork, UnitOfWork};

#[derive(Error, Debug)]
pub enum StoreError {
    /// May succeed if the whole transaction is retried.
    #[error("Transient store error: {0}")]
    Transient(String),

    /// A commit was rejected because data it read changed underneath it.
    /// Nothing was written.
    #[error("Write conflict on {0}")]
    WriteConflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Document serialization error: {0}")]
    Serialization(String),

    #[error("Transaction is already committed or rolled back")]
    TransactionClosed,
}

impl StoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn write_conflict(target: impl Into<String>) -> Self {
        Self::WriteConflict(target.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::WriteConflict(_))
    }

    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A persisted aggregate root.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> i64;
}

/// Non-transactional access to the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Every document of a collection, ordered by id.
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError>;

    /// Open a transaction. Its writes stay invisible to other readers until commit.
    async fn begin(&self) -> Result<Arc<dyn Transaction>, StoreError>;
}

/// One open transaction. Reads observe the transaction's own writes.
#[async_trait]
pub trait Transaction: Send + Sync {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError>;

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError>;

    /// Apply every write atomically. A closed transaction cannot be reused.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Discard every write.
    async fn rollback(&self) -> Result<(), StoreError>;
}
