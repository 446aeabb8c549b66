use super::{CompositeIndex, Document, DocumentStore, Query, check_index, compare_values, merge_fields};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Failure a [`MemoryStore`] can be told to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// Every call fails with permission denied.
    PermissionDenied,
    /// Every call fails as unauthenticated.
    Unauthenticated,
    /// Every call fails with a transport error.
    Unavailable,
}

impl StoreFault {
    fn to_error(self) -> AppError {
        match self {
            StoreFault::PermissionDenied => {
                AppError::PermissionDenied("missing or insufficient permissions".to_string())
            }
            StoreFault::Unauthenticated => AppError::Unauthenticated,
            StoreFault::Unavailable => AppError::Network("store unavailable".to_string()),
        }
    }
}

/// In-process document store.
///
/// Every call suspends once before touching data, the way a network round
/// trip would, so interleavings between concurrent callers are observable.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    indexes: Vec<CompositeIndex>,
    latency: Option<Duration>,
    fault: Mutex<Option<StoreFault>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store without any composite index.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            indexes: Vec::new(),
            latency: None,
            fault: Mutex::new(None),
        }
    }

    /// Declare composite indexes.
    pub fn with_indexes(mut self, indexes: Vec<CompositeIndex>) -> Self {
        self.indexes = indexes;
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent calls fail, or succeed again with `None`.
    pub fn set_fault(&self, fault: Option<StoreFault>) {
        *self.fault.lock() = fault;
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// The fault in effect when a call starts decides its outcome.
    async fn round_trip(&self) -> Result<()> {
        let fault = *self.fault.lock();
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        match fault {
            Some(fault) => Err(fault.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.round_trip().await?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.round_trip().await?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.round_trip().await?;
        let mut collections = self.collections.write();
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        merge_fields(doc, fields);
        Ok(())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        self.round_trip().await?;
        let id = uuid::Uuid::new_v4().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.round_trip().await?;
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;
        merge_fields(doc, fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.round_trip().await?;
        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        self.round_trip().await?;
        check_index(&self.indexes, collection, query)?;

        let mut docs: Vec<Document> = self
            .collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.field(&order.field), b.field(&order.field));
                if order.descending { ord.reverse() } else { ord }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update("users", "nobody", json!({ "a": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        store.set_fault(Some(StoreFault::PermissionDenied));
        let err = store.get("users", "u1").await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));

        store.set_fault(None);
        assert!(store.get("users", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new().with_indexes(vec![CompositeIndex {
            collection: "c".to_string(),
            fields: vec!["owner".to_string(), "at".to_string()],
        }]);
        store.add("c", json!({ "owner": "a", "at": 1 })).await.unwrap();
        store.add("c", json!({ "owner": "a", "at": 3 })).await.unwrap();
        store.add("c", json!({ "owner": "b", "at": 2 })).await.unwrap();

        let docs = store
            .query("c", &Query::new().filter("owner", "a").order_by_desc("at"))
            .await
            .unwrap();
        let ats: Vec<_> = docs.iter().map(|d| d.data["at"].clone()).collect();
        assert_eq!(ats, vec![json!(3), json!(1)]);
    }
}
