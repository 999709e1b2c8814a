//! PostgreSQL Store Implementation
//!
//! One table per entity kind. The entity JSON lives in a `JSONB` column with
//! a GIN index so list containment queries (`@>`) stay indexed.

use async_trait::async_trait;
use lde_config::DatabaseConfig;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

use super::{
    DirectoryStore, Document, EntityKind, ListField, OrderKey, StoreError, StoreResult, INITIAL_VERSION,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool. Call [`init_schema`](Self::init_schema) before use.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration, create the schema and ping.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config.resolved_connection_string()?;

        let connect = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&url);
        let pool = tokio::time::timeout(Duration::from_secs(config.connect_timeout_secs), connect)
            .await
            .map_err(|_| StoreError::Database(sqlx::Error::PoolTimedOut))??;

        let store = Self::new(pool);
        store.init_schema().await?;
        store.ping().await?;

        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(store)
    }

    /// Idempotent schema creation.
    pub async fn init_schema(&self) -> StoreResult<()> {
        for kind in EntityKind::ALL {
            let table = kind.table();
            let statements = [
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        id TEXT PRIMARY KEY,
                        name TEXT NOT NULL,
                        version BIGINT NOT NULL,
                        document JSONB NOT NULL
                    )"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{table}_document ON {table} USING GIN (document jsonb_path_ops)"),
                format!("CREATE INDEX IF NOT EXISTS idx_{table}_name ON {table} (name, id)"),
            ];
            for statement in &statements {
                sqlx::query(statement).execute(&self.pool).await?;
            }
        }
        debug!("Directory schema ready");
        Ok(())
    }

    fn parse_row(kind: EntityKind, row: &PgRow) -> StoreResult<Document> {
        let Json(body): Json<Value> = row.try_get("document")?;
        Ok(Document {
            kind,
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            version: row.try_get("version")?,
            body,
        })
    }

    fn parse_rows(kind: EntityKind, rows: &[PgRow]) -> StoreResult<Vec<Document>> {
        rows.iter().map(|row| Self::parse_row(kind, row)).collect()
    }

    /// Containment probe matching one element of `field`.
    fn containment_probe(field: ListField, value: &str) -> Value {
        let element = if field.holds_snapshots() {
            json!({ "id": value })
        } else {
            json!(value)
        };
        json!({ field.key(): [element] })
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Document>> {
        let query = format!("SELECT id, name, version, document FROM {} WHERE id = $1", kind.table());
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(|r| Self::parse_row(kind, r)).transpose()
    }

    async fn insert(&self, document: &Document) -> StoreResult<()> {
        let query = format!(
            "INSERT INTO {} (id, name, version, document) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
            document.kind.table()
        );
        let result = sqlx::query(&query)
            .bind(&document.id)
            .bind(&document.name)
            .bind(INITIAL_VERSION)
            .bind(Json(&document.body))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate {
                kind: document.kind,
                id: document.id.clone(),
            });
        }
        Ok(())
    }

    async fn save(&self, document: &Document, expected_version: i64) -> StoreResult<u64> {
        let query = format!(
            "UPDATE {} SET name = $2, document = $3, version = version + 1 WHERE id = $1 AND version = $4",
            document.kind.table()
        );
        let result = sqlx::query(&query)
            .bind(&document.id)
            .bind(&document.name)
            .bind(Json(&document.body))
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<u64> {
        let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_all(&self, kind: EntityKind, order: OrderKey) -> StoreResult<Vec<Document>> {
        let order_by = match order {
            OrderKey::Name => "name, id",
            OrderKey::Id => "id",
        };
        let query = format!(
            "SELECT id, name, version, document FROM {} ORDER BY {}",
            kind.table(),
            order_by
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Self::parse_rows(kind, &rows)
    }

    async fn find_where_list_contains(&self, field: ListField, value: &str) -> StoreResult<Vec<Document>> {
        let kind = field.kind();
        let query = format!(
            "SELECT id, name, version, document FROM {} WHERE document @> $1 ORDER BY name, id",
            kind.table()
        );
        let rows = sqlx::query(&query)
            .bind(Json(Self::containment_probe(field, value)))
            .fetch_all(&self.pool)
            .await?;

        debug!(table = kind.table(), field = field.key(), count = rows.len(), "List containment scan");
        Self::parse_rows(kind, &rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment_probe() {
        assert_eq!(
            PgStore::containment_probe(ListField::GroupMembers, "u1"),
            json!({ "members": ["u1"] })
        );
        assert_eq!(
            PgStore::containment_probe(ListField::UserRoles, "r1"),
            json!({ "roles": [{ "id": "r1" }] })
        );
    }
}
