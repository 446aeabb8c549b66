use super::{CompositeIndex, Document, DocumentStore, Query, check_index, merge_fields};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// SQLite-backed document store.
///
/// Documents are kept as JSON text and filtered/ordered with
/// `json_extract`, so the collection schema stays open like the remote
/// store's.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    indexes: Arc<Vec<CompositeIndex>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path, indexes: Vec<CompositeIndex>) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Internal(format!("Failed to open store: {}", e)))?;

        Self::with_connection(conn, indexes)
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory(indexes: Vec<CompositeIndex>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("Failed to open store: {}", e)))?;

        Self::with_connection(conn, indexes)
    }

    fn with_connection(conn: Connection, indexes: Vec<CompositeIndex>) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            indexes: Arc::new(indexes),
        };

        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_user
                ON documents(collection, json_extract(data, '$.userId'));
            "#,
        )
        .map_err(|e| AppError::Internal(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    fn read(conn: &Connection, collection: &str, id: &str) -> Result<Option<Value>> {
        let text: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        text.map(|t| serde_json::from_str(&t).map_err(AppError::from))
            .transpose()
    }

    fn write(conn: &Connection, collection: &str, id: &str, data: &Value) -> Result<()> {
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data",
            params![collection, id, data.to_string()],
        )?;
        Ok(())
    }
}

/// Convert a JSON scalar to the value `json_extract` yields for it.
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        Ok(Self::read(&conn, collection, id)?.map(|data| Document {
            id: id.to_string(),
            data,
        }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let conn = self.conn.lock();
        Self::write(&conn, collection, id, &data)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let conn = self.conn.lock();
        let mut data =
            Self::read(&conn, collection, id)?.unwrap_or_else(|| Value::Object(Default::default()));
        merge_fields(&mut data, fields);
        Self::write(&conn, collection, id, &data)
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection, id, data.to_string()],
        )?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let conn = self.conn.lock();
        let mut data = Self::read(&conn, collection, id)?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;
        merge_fields(&mut data, fields);
        Self::write(&conn, collection, id, &data)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        check_index(&self.indexes, collection, query)?;

        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
        let mut args: Vec<SqlValue> = vec![SqlValue::Text(collection.to_string())];

        for (field, value) in &query.filters {
            sql.push_str(" AND json_extract(data, ?) = ?");
            args.push(SqlValue::Text(json_path(field)));
            args.push(sql_value(value));
        }

        match &query.order_by {
            Some(order) => {
                sql.push_str(" ORDER BY json_extract(data, ?)");
                sql.push_str(if order.descending { " DESC" } else { " ASC" });
                sql.push_str(", id");
                args.push(SqlValue::Text(json_path(&order.field)));
            }
            None => sql.push_str(" ORDER BY id"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            args.push(SqlValue::Integer(limit as i64));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, text)| {
                Ok(Document {
                    id,
                    data: serde_json::from_str(&text)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteStore {
        SqliteStore::open_memory(vec![CompositeIndex {
            collection: "readingProgress".to_string(),
            fields: vec!["userId".to_string(), "lastRead".to_string()],
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = store();
        store.set("users", "u1", json!({ "displayName": "A" })).await.unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data["displayName"], "A");

        store.delete("users", "u1").await.unwrap();
        assert!(store.get("users", "u1").await.unwrap().is_none());
        store.delete("users", "u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_creates_and_keeps_fields() {
        let store = store();
        store.merge("users", "u1", json!({ "a": 1 })).await.unwrap();
        store.merge("users", "u1", json!({ "b": 2 })).await.unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({ "a": 1, "b": 2 }));
    }

    #[tokio::test]
    async fn test_query_uses_json_fields() {
        let store = store();
        for (user, at, fav) in [("u1", 10, true), ("u1", 30, false), ("u2", 20, true)] {
            store
                .add(
                    "readingProgress",
                    json!({ "userId": user, "lastRead": at, "isFavorite": fav }),
                )
                .await
                .unwrap();
        }

        let ordered = store
            .query(
                "readingProgress",
                &Query::new().filter("userId", "u1").order_by_desc("lastRead"),
            )
            .await
            .unwrap();
        let at: Vec<_> = ordered.iter().map(|d| d.data["lastRead"].clone()).collect();
        assert_eq!(at, vec![json!(30), json!(10)]);

        let favorites = store
            .query("readingProgress", &Query::new().filter("isFavorite", true))
            .await
            .unwrap();
        assert_eq!(favorites.len(), 2);
    }

    #[tokio::test]
    async fn test_query_without_index_reports_missing_index() {
        let store = store();
        let err = store
            .query(
                "favorites",
                &Query::new().filter("userId", "u1").order_by_desc("addedAt"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingIndex(_)));
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let store = SqliteStore::open(&path, Vec::new()).unwrap();
        let id = store.add("favorites", json!({ "userId": "u1" })).await.unwrap();
        drop(store);

        let store = SqliteStore::open(&path, Vec::new()).unwrap();
        assert!(store.get("favorites", &id).await.unwrap().is_some());
    }
}
