//! Document store client.
//!
//! The maintenance subsystem talks to its backend only through the
//! [`DocumentStore`] trait: get, overwrite, merge and delete of JSON documents
//! addressed by collection and id. [`SeaOrmDocumentStore`] is the production
//! implementation; tests substitute an in-memory fake.

use crate::{
    entities::{Document, document},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use serde_json::Value;
use tracing::{debug, instrument};

/// Result of reading a document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    /// Whether the document exists
    pub exists: bool,
    /// Document body, `None` when the document does not exist
    pub data: Option<Value>,
    /// Last time the document was written, `None` when it does not exist
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// Snapshot of a document that does not exist.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            exists: false,
            data: None,
            updated_at: None,
        }
    }

    /// Snapshot of an existing document.
    #[must_use]
    pub fn found(data: Value, updated_at: DateTime<Utc>) -> Self {
        Self {
            exists: true,
            data: Some(data),
            updated_at: Some(updated_at),
        }
    }
}

/// Generic document store client.
///
/// Implementations perform no retries; a failed call is reported to the caller
/// and nothing is assumed to have been written.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document. A missing document is not an error.
    async fn get_document(&self, collection: &str, id: &str) -> Result<DocumentSnapshot>;

    /// Overwrites a document, creating it if absent.
    async fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Merges the top-level fields of `partial` into an existing document.
    ///
    /// Fails with [`Error::DocumentNotFound`] if the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, partial: Value) -> Result<()>;

    /// Deletes a document. Deleting a missing document is a no-op.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}

/// Shallow merge of `partial` into `existing`; both must be JSON objects.
pub(crate) fn merge_fields(
    collection: &str,
    id: &str,
    existing: Value,
    partial: Value,
) -> Result<Value> {
    let (Value::Object(mut fields), Value::Object(updates)) = (existing, partial) else {
        return Err(Error::MalformedDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            message: "field merge requires JSON objects".to_string(),
        });
    };
    fields.extend(updates);
    Ok(Value::Object(fields))
}

/// [`DocumentStore`] backed by the `documents` table.
#[derive(Debug)]
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    /// Wraps an open database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<document::Model>> {
        Document::find()
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::DocId.eq(id))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn write(
        &self,
        existing: Option<document::Model>,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<()> {
        let now = Utc::now();
        if let Some(row) = existing {
            let mut active_model: document::ActiveModel = row.into();
            active_model.data = Set(data);
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_row = document::ActiveModel {
                collection: Set(collection.to_string()),
                doc_id: Set(id.to_string()),
                data: Set(data),
                updated_at: Set(now),
                ..Default::default()
            };
            new_row.insert(&self.db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    #[instrument(skip(self))]
    async fn get_document(&self, collection: &str, id: &str) -> Result<DocumentSnapshot> {
        let snapshot = self
            .find(collection, id)
            .await?
            .map_or_else(DocumentSnapshot::missing, |row| {
                DocumentSnapshot::found(row.data, row.updated_at)
            });
        debug!(exists = snapshot.exists, "read document");
        Ok(snapshot)
    }

    #[instrument(skip(self, data))]
    async fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let existing = self.find(collection, id).await?;
        self.write(existing, collection, id, data).await
    }

    #[instrument(skip(self, partial))]
    async fn update_document(&self, collection: &str, id: &str, partial: Value) -> Result<()> {
        let existing = self
            .find(collection, id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let merged = merge_fields(collection, id, existing.data.clone(), partial)?;
        self.write(Some(existing), collection, id, merged).await
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        Document::delete_many()
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::DocId.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_document() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        let snapshot = store.get_document("settings", "nope").await?;
        assert_eq!(snapshot, DocumentSnapshot::missing());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_then_get_document() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        store
            .set_document("settings", "site", json!({ "general": { "siteName": "A" } }))
            .await?;
        let snapshot = store.get_document("settings", "site").await?;

        assert!(snapshot.exists);
        assert_eq!(snapshot.data, Some(json!({ "general": { "siteName": "A" } })));
        assert!(snapshot.updated_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_overwrites_whole_document() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        store.set_document("settings", "site", json!({ "a": 1, "b": 2 })).await?;
        store.set_document("settings", "site", json!({ "c": 3 })).await?;

        let snapshot = store.get_document("settings", "site").await?;
        assert_eq!(snapshot.data, Some(json!({ "c": 3 })));

        // Still a single row for the address
        let rows = Document::find().all(store_db(&store)).await?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_merges_top_level_fields() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        store
            .set_document("settings", "maintenance", json!({ "isActive": false, "message": "x" }))
            .await?;
        store
            .update_document("settings", "maintenance", json!({ "isActive": true }))
            .await?;

        let snapshot = store.get_document("settings", "maintenance").await?;
        assert_eq!(snapshot.data, Some(json!({ "isActive": true, "message": "x" })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        let result = store
            .update_document("settings", "maintenance", json!({ "isActive": true }))
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DocumentNotFound { collection: _, id: _ }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_documents_are_scoped_by_collection() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        store.set_document("settings", "site", json!({ "n": 1 })).await?;
        store.set_document("drafts", "site", json!({ "n": 2 })).await?;

        let settings = store.get_document("settings", "site").await?;
        let drafts = store.get_document("drafts", "site").await?;
        assert_eq!(settings.data, Some(json!({ "n": 1 })));
        assert_eq!(drafts.data, Some(json!({ "n": 2 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_document() -> Result<()> {
        let store = SeaOrmDocumentStore::new(setup_test_db().await?);

        store.set_document("settings", "site", json!({})).await?;
        store.delete_document("settings", "site").await?;
        store.delete_document("settings", "site").await?;

        assert!(!store.get_document("settings", "site").await?.exists);
        Ok(())
    }

    #[tokio::test]
    async fn test_database_failure_is_reported() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("connection refused".to_string())])
            .into_connection();
        let store = SeaOrmDocumentStore::new(db);

        let result = store.get_document("settings", "site").await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));
    }

    #[test]
    fn test_merge_rejects_non_objects() {
        let result = merge_fields("settings", "site", json!({ "a": 1 }), json!(true));
        assert!(matches!(
            result.unwrap_err(),
            Error::MalformedDocument { .. }
        ));
    }

    fn store_db(store: &SeaOrmDocumentStore) -> &DatabaseConnection {
        &store.db
    }
}
