//! Maintenance service - the API the rest of the application calls.
//!
//! Status reads and writes here target the global document. Change
//! notifications are wired to the global document only: they fire for writes
//! made through this service and, when [`MaintenanceService::spawn_global_watcher`]
//! is running, for writes made by anyone else.

use crate::{
    core::{
        flag::{MaintenanceFlag, SyncSource},
        maintenance_store::MaintenanceStore,
        reconciler::MaintenanceReconciler,
    },
    errors::{Error, Result},
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, instrument, warn};

/// Handle returned by [`MaintenanceService::on_maintenance_status_change`].
///
/// Delivery stops when the handle is unsubscribed or dropped.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stops delivering changes to the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Global maintenance status API with change notifications.
#[derive(Clone)]
pub struct MaintenanceService {
    store: MaintenanceStore,
    reconciler: MaintenanceReconciler,
    global_tx: Arc<watch::Sender<Option<MaintenanceFlag>>>,
}

impl MaintenanceService {
    /// Creates a service over the given store. No value is published until the
    /// global document is first read or written.
    #[must_use]
    pub fn new(store: MaintenanceStore) -> Self {
        let (global_tx, _) = watch::channel(None);
        Self {
            reconciler: MaintenanceReconciler::new(store.clone()),
            store,
            global_tx: Arc::new(global_tx),
        }
    }

    /// Reads the global flag.
    pub async fn get_maintenance_status(&self) -> Result<bool> {
        Ok(self.refresh().await?.is_active)
    }

    /// Writes the global flag and notifies subscribers.
    #[instrument(skip(self))]
    pub async fn set_maintenance_status(
        &self,
        is_active: bool,
        actor: Option<&str>,
        message: Option<&str>,
    ) -> Result<()> {
        let flag = self.store.write_global(is_active, actor, message).await?;
        self.publish(flag);
        Ok(())
    }

    /// Calls `callback` with the global flag now (once known) and after every change.
    pub fn on_maintenance_status_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut rx = self.global_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut last = rx.borrow_and_update().as_ref().map(|flag| flag.is_active);
            if let Some(value) = last {
                callback(value);
            }
            while rx.changed().await.is_ok() {
                let current = rx.borrow_and_update().as_ref().map(|flag| flag.is_active);
                if current != last {
                    if let Some(value) = current {
                        callback(value);
                    }
                    last = current;
                }
            }
        });
        Subscription { handle }
    }

    /// Reconciles both copies and notifies subscribers of the result.
    #[instrument(skip(self))]
    pub async fn synchronize_maintenance_mode(
        &self,
        forced_source: Option<SyncSource>,
    ) -> Result<bool> {
        let result = self.reconciler.synchronize(forced_source).await;
        self.refresh_after_sync(&result).await?;
        result
    }

    /// Writes `is_active` to both copies and notifies subscribers.
    pub async fn force_set(&self, is_active: bool, actor: Option<&str>) -> Result<()> {
        let result = self.reconciler.force_set(is_active, actor).await;
        self.refresh_after_sync(&result).await?;
        result
    }

    /// Publishes the global document after a two-copy write.
    ///
    /// A partial sync has already written the global copy, so subscribers are
    /// refreshed before the original error is returned.
    async fn refresh_after_sync<T>(&self, result: &Result<T>) -> Result<()> {
        match result {
            Ok(_) => self.refresh().await.map(drop),
            Err(Error::PartialSync { .. }) => {
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Failed to publish global flag after partial sync");
                }
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }

    /// Re-reads the global document and publishes it if it changed.
    pub async fn refresh(&self) -> Result<MaintenanceFlag> {
        let flag = self.store.read_global().await?;
        self.publish(flag.clone());
        Ok(flag)
    }

    /// Polls the global document every `interval` so external writes reach subscribers.
    #[must_use]
    pub fn spawn_global_watcher(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = service.refresh().await {
                    warn!(error = %e, "Failed to poll global maintenance document");
                }
            }
        })
    }

    fn publish(&self, flag: MaintenanceFlag) {
        let changed = self.global_tx.send_if_modified(|current| {
            if current.as_ref() == Some(&flag) {
                false
            } else {
                *current = Some(flag);
                true
            }
        });
        if changed {
            debug!("Published global maintenance flag");
        }
    }
}
