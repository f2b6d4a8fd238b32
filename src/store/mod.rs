//! Document store: one collection per entity type, each document an id plus a JSON payload.
//!
//! `PgStore` keeps collections as JSONB tables in PostgreSQL; `MemoryStore` is an
//! in-process fake with the same semantics for tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_collections, PgStore};

use crate::error::AppError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Courses,
    Students,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Courses, Collection::Students];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::Students => "students",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub payload: Map<String, Value>,
}

impl Document {
    /// Decode into a typed record; the record's `id` field is filled from the document id.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let mut map = self.payload.clone();
        map.insert("id".into(), Value::String(self.id.to_string()));
        serde_json::from_value(Value::Object(map)).map_err(|e| AppError::Corrupt(format!("{}: {}", self.id, e)))
    }
}

/// Serialize a record or input into payload fields. Any `id` key is dropped; the store owns ids.
pub fn encode<T: Serialize>(value: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(AppError::Corrupt(format!("expected a JSON object, got {}", other))),
    }
}

/// When a document is deleted, pull its id out of `field` (an array of id strings) on every document in `collection`.
#[derive(Clone, Copy, Debug)]
pub struct Cascade {
    pub collection: Collection,
    pub field: &'static str,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap round-trip proving the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;

    /// All documents in insertion order.
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Documents whose id is in `ids`, in insertion order. Unknown ids are skipped.
    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, AppError>;

    /// Insert a new document; the store assigns a fresh id.
    async fn insert(&self, collection: Collection, payload: Map<String, Value>) -> Result<Document, AppError>;

    /// Merge `fields` into the stored payload. Returns the updated document, or `None` if absent.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, AppError>;

    /// Remove a document, returning it as it was before removal. The cascade runs atomically with the removal.
    async fn delete(
        &self,
        collection: Collection,
        id: Uuid,
        cascade: Option<Cascade>,
    ) -> Result<Option<Document>, AppError>;
}
