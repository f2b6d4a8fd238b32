//! PostgreSQL-backed document store. Each collection is a table of `(id, payload JSONB)` rows.

use super::{Cascade, Collection, Document, DocumentStore};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(schema: &str, collection: Collection) -> String {
    format!("{}.{}", quoted(schema), quoted(collection.name()))
}

/// Create the schema and one table per collection if they do not exist yet.
/// Ids default to `gen_random_uuid()` (PostgreSQL 13+), so they are never reused.
pub async fn ensure_collections(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;

    for collection in Collection::ALL {
        let table = qualified(schema, collection);
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                payload JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table
        );
        sqlx::query(&ddl).execute(pool).await?;
        let index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (created_at, id)",
            quoted(&format!("{}_created_at_idx", collection.name())),
            table
        );
        sqlx::query(&index).execute(pool).await?;
        tracing::debug!(collection = %collection, "collection ready");
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    fn table(&self, collection: Collection) -> String {
        qualified(&self.schema, collection)
    }
}

fn into_document((id, payload): (Uuid, Value)) -> Result<Document, AppError> {
    match payload {
        Value::Object(payload) => Ok(Document { id, payload }),
        other => Err(AppError::Corrupt(format!("{}: payload is not an object: {}", id, other))),
    }
}

/// Rows whose payload is not an object are logged and skipped.
fn into_documents(collection: Collection, rows: Vec<(Uuid, Value)>) -> Vec<Document> {
    rows.into_iter()
        .filter_map(|row| match into_document(row) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, AppError> {
        let sql = format!("SELECT id, payload FROM {} ORDER BY created_at, id", self.table(collection));
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(into_documents(collection, rows))
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError> {
        let sql = format!("SELECT id, payload FROM {} WHERE id = $1", self.table(collection));
        tracing::debug!(sql = %sql, %id, "query");
        let row: Option<(Uuid, Value)> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(into_document).transpose()
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, payload FROM {} WHERE id = ANY($1) ORDER BY created_at, id",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, ids = ?ids, "query");
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(&sql).bind(ids.to_vec()).fetch_all(&self.pool).await?;
        Ok(into_documents(collection, rows))
    }

    async fn insert(&self, collection: Collection, payload: Map<String, Value>) -> Result<Document, AppError> {
        let sql = format!(
            "INSERT INTO {} (payload) VALUES ($1) RETURNING id, payload",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, "query");
        let row: (Uuid, Value) = sqlx::query_as(&sql)
            .bind(Value::Object(payload))
            .fetch_one(&self.pool)
            .await?;
        into_document(row)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Document>, AppError> {
        let sql = format!(
            "UPDATE {} SET payload = payload || $2, updated_at = NOW() WHERE id = $1 RETURNING id, payload",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, %id, "query");
        let row: Option<(Uuid, Value)> = sqlx::query_as(&sql)
            .bind(id)
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_document).transpose()
    }

    async fn delete(
        &self,
        collection: Collection,
        id: Uuid,
        cascade: Option<Cascade>,
    ) -> Result<Option<Document>, AppError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING id, payload", self.table(collection));
        tracing::debug!(sql = %sql, %id, "query (tx)");
        let row: Option<(Uuid, Value)> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *tx).await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(cascade) = cascade {
            let sql = format!(
                r#"
                UPDATE {} SET
                    payload = jsonb_set(payload, ARRAY[$2::text], (payload -> $2::text) - $1::text),
                    updated_at = NOW()
                WHERE jsonb_typeof(payload -> $2::text) = 'array' AND (payload -> $2::text) ? $1::text
                "#,
                self.table(cascade.collection)
            );
            tracing::debug!(sql = %sql, %id, field = cascade.field, "query (tx)");
            let pruned = sqlx::query(&sql)
                .bind(id.to_string())
                .bind(cascade.field)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tracing::info!(
                collection = %cascade.collection,
                field = cascade.field,
                %id,
                pruned,
                "pruned references to deleted document"
            );
        }

        tx.commit().await?;
        into_document(row).map(Some)
    }
}
