//! Document store contract.
//!
//! The library keeps its durable state in a document store with three
//! collections (`users`, `readingProgress`, `favorites`). Only the operations
//! below are relied upon, so any backend offering them can be plugged in.

mod memory;
mod sqlite;

pub use memory::{MemoryStore, StoreFault};
pub use sqlite::SqliteStore;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document body (a JSON object).
    pub data: Value,
}

impl Document {
    /// Deserialize the document body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.data)?)
    }

    /// Read a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Sort order for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order by.
    pub field: String,
    /// Largest first.
    pub descending: bool,
}

/// Equality-filtered, optionally ordered and limited query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Field equality filters, all of which must hold.
    pub filters: Vec<(String, Value)>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Optional maximum result count.
    pub limit: Option<usize>,
}

impl Query {
    /// Empty query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Order results by `field`, largest first.
    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same filters, without ordering or limit.
    pub fn unordered(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            order_by: None,
            limit: None,
        }
    }

    /// Whether a document body satisfies every filter.
    pub fn matches(&self, data: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| data.get(field) == Some(value))
    }
}

/// A declared composite index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeIndex {
    /// Collection the index covers.
    pub collection: String,
    /// Filter fields followed by the order field.
    pub fields: Vec<String>,
}

/// Check that `query` on `collection` is served by one of `indexes`.
///
/// Filtering on some fields while ordering by another needs a composite
/// index whose last field is the order field and whose other fields are
/// exactly the filtered ones.
pub fn check_index(indexes: &[CompositeIndex], collection: &str, query: &Query) -> Result<()> {
    let Some(order) = &query.order_by else {
        return Ok(());
    };

    let filtered: HashSet<&str> = query
        .filters
        .iter()
        .map(|(field, _)| field.as_str())
        .filter(|field| *field != order.field)
        .collect();

    if filtered.is_empty() {
        return Ok(());
    }

    let covered = indexes.iter().any(|index| {
        index.collection == collection
            && index.fields.last().map(String::as_str) == Some(order.field.as_str())
            && index.fields[..index.fields.len() - 1]
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                == filtered
    });

    if covered {
        Ok(())
    } else {
        let mut fields: Vec<&str> = filtered.into_iter().collect();
        fields.sort_unstable();
        Err(AppError::MissingIndex(format!(
            "query on '{}' filtering [{}] ordered by '{}' requires a composite index",
            collection,
            fields.join(", "),
            order.field
        )))
    }
}

/// Total order over JSON values used for sorting documents.
///
/// Missing sorts before null, then booleans, numbers, strings, and
/// everything else.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Shallow-merge the top-level fields of `fields` into `target`.
pub fn merge_fields(target: &mut Value, fields: Value) {
    match (target, fields) {
        (Value::Object(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        (target, fields) => *target = fields,
    }
}

/// Run a remote call with a deadline.
pub async fn with_timeout<T>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} did not complete within {:?}",
            what, limit
        ))),
    }
}

/// Remote document store operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Merge fields into a document, creating it if absent.
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Insert a document under a generated id.
    async fn add(&self, collection: &str, data: Value) -> Result<String>;

    /// Merge fields into an existing document.
    ///
    /// Fails with [`AppError::NotFound`] when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Run a query against a collection.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn progress_index() -> CompositeIndex {
        CompositeIndex {
            collection: "readingProgress".to_string(),
            fields: vec!["userId".to_string(), "lastRead".to_string()],
        }
    }

    #[test]
    fn test_index_not_needed_without_order() {
        let query = Query::new().filter("userId", "u1").filter("storyId", "s1");
        assert!(check_index(&[], "readingProgress", &query).is_ok());
    }

    #[test]
    fn test_index_required_for_filter_and_order() {
        let query = Query::new().filter("userId", "u1").order_by_desc("lastRead");
        let err = check_index(&[], "readingProgress", &query).unwrap_err();
        assert!(matches!(err, AppError::MissingIndex(_)));

        assert!(check_index(&[progress_index()], "readingProgress", &query).is_ok());
        assert!(check_index(&[progress_index()], "favorites", &query).is_err());
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(1)), Some(&json!(2.5))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!(null))), Ordering::Less);
    }

    #[test]
    fn test_merge_fields() {
        let mut doc = json!({ "a": 1, "b": { "x": 1 } });
        merge_fields(&mut doc, json!({ "b": { "y": 2 }, "c": true }));
        assert_eq!(doc, json!({ "a": 1, "b": { "y": 2 }, "c": true }));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), "slow call", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }
}
