//! In-process document store with the same semantics as `PgStore`. Used by tests.

use super::{Cascade, Collection, Document, DocumentStore};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    /// Documents per collection, kept in insertion order.
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection: every subsequent call fails with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a raw payload as-is, bypassing validation. Lets tests plant malformed documents.
    pub async fn insert_raw(&self, collection: Collection, payload: Map<String, Value>) -> Uuid {
        let id = Uuid::new_v4();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(Document { id, payload });
        id
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.check_online()
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, AppError> {
        self.check_online()?;
        let guard = self.collections.read().await;
        Ok(guard.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError> {
        self.check_online()?;
        let guard = self.collections.read().await;
        Ok(guard
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        self.check_online()?;
        let guard = self.collections.read().await;
        Ok(guard
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, payload: Map<String, Value>) -> Result<Document, AppError> {
        self.check_online()?;
        let doc = Document {
            id: Uuid::new_v4(),
            payload,
        };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, AppError> {
        self.check_online()?;
        let mut guard = self.collections.write().await;
        let Some(doc) = guard
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };
        doc.payload.extend(fields);
        Ok(Some(doc.clone()))
    }

    async fn delete(
        &self,
        collection: Collection,
        id: Uuid,
        cascade: Option<Cascade>,
    ) -> Result<Option<Document>, AppError> {
        self.check_online()?;
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(pos) = docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        let removed = docs.remove(pos);

        if let Some(cascade) = cascade {
            let target = Value::String(id.to_string());
            for doc in guard.get_mut(&cascade.collection).into_iter().flatten() {
                if let Some(Value::Array(refs)) = doc.payload.get_mut(cascade.field) {
                    refs.retain(|r| *r != target);
                }
            }
        }
        Ok(Some(removed))
    }
}
