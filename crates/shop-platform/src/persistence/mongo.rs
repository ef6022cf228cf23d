use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{
    Error as MongoError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT,
};
use mongodb::{Client, ClientSession, Database};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{DocumentStore, StoreError, Transaction};

/// Extra commit attempts when the server cannot confirm the commit outcome.
const COMMIT_RETRIES: u32 = 3;

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        if err.contains_label(TRANSIENT_TRANSACTION_ERROR) {
            StoreError::Transient(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

fn to_document(id: i64, document: &Value) -> Result<Document, StoreError> {
    let mut doc = bson::to_document(document)?;
    doc.insert("_id", id);
    Ok(doc)
}

fn from_document(mut doc: Document) -> Result<Value, StoreError> {
    doc.remove("_id");
    Ok(bson::from_document(doc)?)
}

fn field_filter(field: &str, value: &Value) -> Result<Document, StoreError> {
    let mut filter = Document::new();
    filter.insert(field, bson::to_bson(value)?);
    Ok(filter)
}

/// MongoDB document store. Documents are keyed by `_id` = entity id.
///
/// Transactions need a replica set deployment.
#[derive(Clone)]
pub struct MongoDocumentStore {
    client: Client,
    database: Database,
}

impl MongoDocumentStore {
    pub fn new(client: Client, database: Database) -> Self {
        Self { client, database }
    }

    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database_name);
        info!(database = %database_name, "Connected to MongoDB");
        Ok(Self::new(client, database))
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection::<Document>(name)
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Value>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        docs.into_iter().map(from_document).collect()
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError> {
        self.collection(collection)
            .find_one(doc! { "_id": id })
            .await?
            .map(from_document)
            .transpose()
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.find(collection, field_filter(field, value)?).await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.find(collection, doc! {}).await
    }

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError> {
        self.collection(collection)
            .replace_one(doc! { "_id": id }, to_document(id, &document)?)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn begin(&self) -> Result<Arc<dyn Transaction>, StoreError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        debug!("Started MongoDB transaction");

        Ok(Arc::new(MongoTransaction {
            database: self.database.clone(),
            session: Mutex::new(session),
            closed: AtomicBool::new(false),
        }))
    }
}

/// A multi-document MongoDB transaction bound to one client session.
pub struct MongoTransaction {
    database: Database,
    session: Mutex<ClientSession>,
    closed: AtomicBool,
}

impl MongoTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection::<Document>(name)
    }

    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        let mut session = self.session.lock().await;
        let mut cursor = self
            .collection(collection)
            .find(filter)
            .sort(doc! { "_id": 1 })
            .session(&mut *session)
            .await?;

        let mut values = Vec::new();
        while let Some(doc) = cursor.next(&mut *session).await {
            values.push(from_document(doc?)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl Transaction for MongoTransaction {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let mut session = self.session.lock().await;
        self.collection(collection)
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?
            .map(from_document)
            .transpose()
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.find(collection, field_filter(field, value)?).await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.find(collection, doc! {}).await
    }

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        let replacement = to_document(id, &document)?;
        let mut session = self.session.lock().await;
        self.collection(collection)
            .replace_one(doc! { "_id": id }, replacement)
            .upsert(true)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let mut session = self.session.lock().await;
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }

        let mut session = self.session.lock().await;
        let mut attempt = 0;
        loop {
            match session.commit_transaction().await {
                Ok(()) => {
                    debug!("Committed MongoDB transaction");
                    return Ok(());
                }
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempt < COMMIT_RETRIES =>
                {
                    attempt += 1;
                    warn!(attempt, error = %e, "Commit outcome unknown, retrying commit");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }

        let mut session = self.session.lock().await;
        session.abort_transaction().await?;
        debug!("Aborted MongoDB transaction");
        Ok(())
    }
}
