use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{DocumentStore, StoreError, Transaction};

/// One collection: documents plus the write version of each document and of
/// the collection as a whole.
#[derive(Default)]
struct Shelf {
    docs: BTreeMap<i64, Value>,
    versions: HashMap<i64, u64>,
    version: u64,
}

impl Shelf {
    fn version_of(&self, id: i64) -> u64 {
        self.versions.get(&id).copied().unwrap_or(0)
    }

    fn write(&mut self, id: i64, document: Option<Value>) -> bool {
        let existed = match document {
            Some(doc) => self.docs.insert(id, doc).is_some(),
            None => self.docs.remove(&id).is_some(),
        };
        *self.versions.entry(id).or_default() += 1;
        self.version += 1;
        existed
    }
}

type Collections = HashMap<String, Shelf>;

/// In-memory document store for development and tests.
///
/// Transactions stage their writes and apply them under a single write lock
/// on commit. Concurrency control is optimistic: a transaction remembers the
/// version of every document it read or wrote (and of every collection it
/// scanned), and its commit is rejected with `StoreError::WriteConflict` if
/// any of them changed in the meantime.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    data: Arc<RwLock<Collections>>,
    failing_commits: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail with a transient error.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Number of successfully committed transactions.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn count(&self, collection: &str) -> usize {
        self.data.read().get(collection).map_or(0, |shelf| shelf.docs.len())
    }
}

fn matches_field(document: &Value, field: &str, value: &Value) -> bool {
    document.get(field) == Some(value)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError> {
        Ok(self
            .data
            .read()
            .get(collection)
            .and_then(|shelf| shelf.docs.get(&id))
            .cloned())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .data
            .read()
            .get(collection)
            .map(|shelf| {
                shelf
                    .docs
                    .values()
                    .filter(|doc| matches_field(doc, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .data
            .read()
            .get(collection)
            .map(|shelf| shelf.docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError> {
        self.data
            .write()
            .entry(collection.to_string())
            .or_default()
            .write(id, Some(document));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .data
            .write()
            .get_mut(collection)
            .map(|shelf| shelf.docs.contains_key(&id) && shelf.write(id, None))
            .unwrap_or(false))
    }

    async fn begin(&self) -> Result<Arc<dyn Transaction>, StoreError> {
        Ok(Arc::new(MemoryTransaction {
            store: self.clone(),
            staged: Mutex::new(HashMap::new()),
            observed: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Staged writes keyed by collection then id; `None` marks a delete.
type WriteSet = HashMap<String, BTreeMap<i64, Option<Value>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Observed {
    Document(String, i64),
    Scan(String),
}

pub struct MemoryTransaction {
    store: MemoryDocumentStore,
    staged: Mutex<WriteSet>,
    /// Version seen the first time each document or collection was touched.
    observed: Mutex<HashMap<Observed, u64>>,
    closed: AtomicBool,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }

    fn observe(&self, key: Observed, version: u64) {
        self.observed.lock().entry(key).or_insert(version);
    }

    fn observe_document(&self, data: &Collections, collection: &str, id: i64) {
        let version = data.get(collection).map_or(0, |shelf| shelf.version_of(id));
        self.observe(Observed::Document(collection.to_string(), id), version);
    }

    /// Committed documents of `collection` overlaid with this transaction's writes.
    fn view(&self, collection: &str) -> BTreeMap<i64, Value> {
        let mut docs = {
            let data = self.store.data.read();
            let shelf = data.get(collection);
            self.observe(
                Observed::Scan(collection.to_string()),
                shelf.map_or(0, |s| s.version),
            );
            shelf.map(|s| s.docs.clone()).unwrap_or_default()
        };

        if let Some(writes) = self.staged.lock().get(collection) {
            for (id, write) in writes {
                match write {
                    Some(doc) => {
                        docs.insert(*id, doc.clone());
                    }
                    None => {
                        docs.remove(id);
                    }
                }
            }
        }
        docs
    }

    fn stage(&self, collection: &str, id: i64, write: Option<Value>) {
        self.observe_document(&self.store.data.read(), collection, id);
        self.staged
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id, write);
    }

    /// First observed version that no longer matches the committed state.
    fn find_conflict(&self, data: &Collections) -> Option<Observed> {
        self.observed
            .lock()
            .iter()
            .find(|(key, seen)| {
                let current = match key {
                    Observed::Document(collection, id) => {
                        data.get(collection).map_or(0, |shelf| shelf.version_of(*id))
                    }
                    Observed::Scan(collection) => {
                        data.get(collection).map_or(0, |shelf| shelf.version)
                    }
                };
                current != **seen
            })
            .map(|(key, _)| key.clone())
    }

    fn close(&self) {
        self.staged.lock().clear();
        self.observed.lock().clear();
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let staged = self
            .staged
            .lock()
            .get(collection)
            .and_then(|writes| writes.get(&id))
            .cloned();
        if let Some(write) = staged {
            return Ok(write);
        }

        let data = self.store.data.read();
        self.observe_document(&data, collection, id);
        Ok(data
            .get(collection)
            .and_then(|shelf| shelf.docs.get(&id))
            .cloned())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .view(collection)
            .into_values()
            .filter(|doc| matches_field(doc, field, value))
            .collect())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        Ok(self.view(collection).into_values().collect())
    }

    async fn upsert(&self, collection: &str, id: i64, document: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.stage(collection, id, Some(document));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let existed = Transaction::get(self, collection, id).await?.is_some();
        self.stage(collection, id, None);
        Ok(existed)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }

        let injected = self
            .store
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            self.close();
            return Err(StoreError::transient("injected commit failure"));
        }

        let mut data = self.store.data.write();
        if let Some(changed) = self.find_conflict(&data) {
            drop(data);
            self.close();
            return Err(StoreError::write_conflict(match changed {
                Observed::Document(collection, id) => format!("{}/{}", collection, id),
                Observed::Scan(collection) => collection,
            }));
        }

        let writes = std::mem::take(&mut *self.staged.lock());
        for (collection, docs) in writes {
            let shelf = data.entry(collection).or_default();
            for (id, write) in docs {
                shelf.write(id, write);
            }
        }
        drop(data);
        self.observed.lock().clear();

        self.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::TransactionClosed);
        }
        self.close();
        Ok(())
    }
}
