//! Shared test utilities for `MaintenanceBuddy`.
//!
//! This module provides helpers for setting up test databases, an in-memory
//! document store with failure injection, and pre-wired maintenance stores.

use crate::{
    core::{
        document_store::{DocumentSnapshot, DocumentStore, SeaOrmDocumentStore, merge_fields},
        maintenance_store::MaintenanceStore,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes tracing output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A maintenance store over a fresh in-memory `SQLite` database.
pub async fn setup_sqlite_store() -> Result<MaintenanceStore> {
    let db = setup_test_db().await?;
    Ok(MaintenanceStore::new(Arc::new(SeaOrmDocumentStore::new(db))))
}

/// A maintenance store over a [`FakeDocumentStore`], returning both so tests can
/// inject failures and inspect raw documents.
#[must_use]
pub fn setup_fake_store() -> (Arc<FakeDocumentStore>, MaintenanceStore) {
    let documents = Arc::new(FakeDocumentStore::default());
    let store = MaintenanceStore::new(Arc::clone(&documents) as Arc<dyn DocumentStore>);
    (documents, store)
}

/// Scripted behaviour for one upcoming write.
#[derive(Clone, Copy, Debug)]
pub struct WriteStep {
    /// How long the write takes before it lands (or fails)
    pub delay: Duration,
    /// Whether the write fails after the delay
    pub fail: bool,
}

/// In-memory [`DocumentStore`] with failure injection.
#[derive(Default)]
pub struct FakeDocumentStore {
    documents: Mutex<HashMap<(String, String), (Value, DateTime<Utc>)>>,
    failing_documents: Mutex<HashSet<String>>,
    write_steps: Mutex<VecDeque<WriteStep>>,
    /// Every read fails while set
    pub fail_reads: AtomicBool,
    /// Every write fails while set
    pub fail_writes: AtomicBool,
    /// Number of write attempts seen, including failed ones
    pub write_calls: AtomicU64,
}

impl FakeDocumentStore {
    /// Stores a document with an explicit last-write time, bypassing failure injection.
    pub async fn insert_raw(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        updated_at: DateTime<Utc>,
    ) {
        self.documents
            .lock()
            .await
            .insert((collection.to_string(), id.to_string()), (data, updated_at));
    }

    /// Returns a document body, bypassing failure injection.
    pub async fn raw(&self, collection: &str, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .await
            .get(&(collection.to_string(), id.to_string()))
            .map(|(data, _)| data.clone())
    }

    /// Makes every write to the document `id` fail.
    pub async fn fail_writes_to(&self, id: &str) {
        self.failing_documents.lock().await.insert(id.to_string());
    }

    /// Queues scripted behaviour for the next writes, in call order.
    pub async fn script_writes(&self, steps: impl IntoIterator<Item = WriteStep>) {
        self.write_steps.lock().await.extend(steps);
    }

    async fn before_write(&self, id: &str) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.write_steps.lock().await.pop_front();
        if let Some(step) = step {
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            if step.fail {
                return Err(unavailable("scripted write failure"));
            }
        }
        let rejected = self.failing_documents.lock().await.contains(id);
        if rejected || self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("write rejected"));
        }
        Ok(())
    }
}

fn unavailable(message: &str) -> Error {
    Error::StoreUnavailable {
        message: message.to_string(),
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<DocumentSnapshot> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable("read rejected"));
        }
        Ok(self
            .documents
            .lock()
            .await
            .get(&(collection.to_string(), id.to_string()))
            .map_or_else(DocumentSnapshot::missing, |(data, updated_at)| {
                DocumentSnapshot::found(data.clone(), *updated_at)
            }))
    }

    async fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.before_write(id).await?;
        self.documents
            .lock()
            .await
            .insert((collection.to_string(), id.to_string()), (data, Utc::now()));
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, partial: Value) -> Result<()> {
        self.before_write(id).await?;
        let mut documents = self.documents.lock().await;
        let key = (collection.to_string(), id.to_string());
        let existing = documents
            .get(&key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| Error::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let merged = merge_fields(collection, id, existing, partial)?;
        documents.insert(key, (merged, Utc::now()));
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.before_write(id).await?;
        self.documents
            .lock()
            .await
            .remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }
}
