//! Maintenance reconciler - collapses the two copies of the flag into one value.
//!
//! Without a forced source the most recently updated copy wins and ties go to
//! the global document. The winning value is then written to both copies. The
//! two writes are separate calls with no transaction around them: if the
//! second fails, the copies can disagree again and the caller gets
//! [`Error::PartialSync`].

use crate::{
    core::{
        flag::{MaintenanceFlag, SiteFlagSnapshot, SyncSource},
        maintenance_store::MaintenanceStore,
    },
    errors::{Error, Result},
};
use tracing::{info, instrument, warn};

/// Picks the authoritative copy: the site copy only wins when strictly newer.
#[must_use]
pub fn resolve(global: &MaintenanceFlag, site: &SiteFlagSnapshot) -> SyncSource {
    if site.updated_at > global.updated_at {
        SyncSource::Site
    } else {
        SyncSource::Global
    }
}

/// Value written to both copies by a synchronize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Copy that was treated as authoritative
    pub source: SyncSource,
    /// Resolved flag value
    pub is_active: bool,
    /// Banner text carried over from the winning copy
    pub message: Option<String>,
}

/// Synchronizes the global document and the site copy of the flag.
#[derive(Clone)]
pub struct MaintenanceReconciler {
    store: MaintenanceStore,
}

impl MaintenanceReconciler {
    /// Creates a reconciler over the given store.
    #[must_use]
    pub const fn new(store: MaintenanceStore) -> Self {
        Self { store }
    }

    /// Resolves a single value for the flag and writes it to both copies.
    ///
    /// With `forced_source` only that copy is read and it wins unconditionally.
    /// Returns the resolved value.
    pub async fn synchronize(&self, forced_source: Option<SyncSource>) -> Result<bool> {
        Ok(self.reconcile(forced_source).await?.is_active)
    }

    /// Same as [`Self::synchronize`], returning the winning copy and its message too.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, forced_source: Option<SyncSource>) -> Result<Resolution> {
        let (winner, is_active, message) = match forced_source {
            Some(SyncSource::Global) => {
                let global = self.store.read_global().await?;
                (SyncSource::Global, global.is_active, global.message)
            }
            Some(SyncSource::Site) => {
                let site = self.store.read_site_snapshot().await?;
                (SyncSource::Site, site.is_active, site.message)
            }
            None => {
                let global = self.store.read_global().await?;
                let site = self.store.read_site_snapshot().await?;
                if global.is_active != site.is_active {
                    warn!(
                        global = global.is_active,
                        site = site.is_active,
                        "Maintenance copies disagree"
                    );
                }
                match resolve(&global, &site) {
                    SyncSource::Global => (SyncSource::Global, global.is_active, global.message),
                    SyncSource::Site => (SyncSource::Site, site.is_active, site.message),
                }
            }
        };

        info!(%winner, is_active, forced = forced_source.is_some(), "Resolved maintenance flag");
        self.write_both(is_active, None, message.as_deref()).await?;
        Ok(Resolution {
            source: winner,
            is_active,
            message,
        })
    }

    /// Writes `is_active` to both copies regardless of their current values.
    #[instrument(skip(self))]
    pub async fn force_set(&self, is_active: bool, actor: Option<&str>) -> Result<()> {
        self.write_both(is_active, actor, None).await?;
        info!(is_active, "Forced maintenance flag on both copies");
        Ok(())
    }

    async fn write_both(
        &self,
        is_active: bool,
        actor: Option<&str>,
        message: Option<&str>,
    ) -> Result<()> {
        self.store.write_global(is_active, actor, message).await?;
        self.store
            .write_site_flag(is_active, message)
            .await
            .map_err(|e| Error::PartialSync {
                succeeded: SyncSource::Global,
                failed: SyncSource::Site,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::flag::{GLOBAL_DOC_ID, SETTINGS_COLLECTION, SITE_DOC_ID, TimestampSource};
    use crate::test_utils::{init_test_tracing, setup_fake_store, setup_sqlite_store};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn flag_at(is_active: bool, minutes_ago: i64) -> MaintenanceFlag {
        MaintenanceFlag {
            is_active,
            updated_at: Utc::now() - Duration::minutes(minutes_ago),
            updated_by: None,
            message: None,
        }
    }

    fn site_at(is_active: bool, updated_at: chrono::DateTime<Utc>) -> SiteFlagSnapshot {
        SiteFlagSnapshot {
            is_active,
            message: None,
            updated_at,
            timestamp_source: TimestampSource::Field,
        }
    }

    #[test]
    fn test_resolve_prefers_newer_copy() {
        let global = flag_at(true, 10);
        let newer_site = site_at(false, Utc::now());
        let older_site = site_at(false, global.updated_at - Duration::minutes(1));

        assert_eq!(resolve(&global, &newer_site), SyncSource::Site);
        assert_eq!(resolve(&global, &older_site), SyncSource::Global);
    }

    #[test]
    fn test_resolve_tie_goes_to_global() {
        let global = flag_at(true, 5);
        let site = site_at(false, global.updated_at);
        assert_eq!(resolve(&global, &site), SyncSource::Global);
    }

    #[tokio::test]
    async fn test_synchronize_newer_global_wins() -> Result<()> {
        init_test_tracing();
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        let now = Utc::now();
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                GLOBAL_DOC_ID,
                json!({ "isActive": true, "updatedAt": now }),
                now,
            )
            .await;
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                SITE_DOC_ID,
                json!({ "general": {
                    "maintenanceMode": false,
                    "maintenanceUpdatedAt": now - Duration::hours(1)
                } }),
                now - Duration::hours(1),
            )
            .await;

        assert!(reconciler.synchronize(None).await?);
        assert!(store.read_global().await?.is_active);
        assert!(store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_synchronize_newer_site_wins_end_to_end() -> Result<()> {
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        let t1 = Utc::now() - Duration::hours(2);
        let t2 = Utc::now() - Duration::hours(1);
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                GLOBAL_DOC_ID,
                json!({ "isActive": true, "updatedAt": t1 }),
                t1,
            )
            .await;
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                SITE_DOC_ID,
                json!({ "general": { "maintenanceMode": false, "maintenanceUpdatedAt": t2 } }),
                t2,
            )
            .await;

        let resolved = reconciler.synchronize(None).await?;

        assert!(!resolved);
        assert!(!store.read_global().await?.is_active);
        assert!(!store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_synchronize_forced_site_ignores_global() -> Result<()> {
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        let now = Utc::now();
        store.write_site_flag(false, None).await?;
        // Global is newer and active, but the site copy is forced
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                GLOBAL_DOC_ID,
                json!({ "isActive": true, "updatedAt": Utc::now() + Duration::hours(1) }),
                now,
            )
            .await;

        assert!(!reconciler.synchronize(Some(SyncSource::Site)).await?);
        assert!(!store.read_global().await?.is_active);
        assert!(!store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_synchronize_forced_global() -> Result<()> {
        let (_, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        store.write_global(true, Some("alice"), Some("Migrating")).await?;
        store.write_site_flag(false, None).await?;

        assert!(reconciler.synchronize(Some(SyncSource::Global)).await?);
        let (settings, _) = store.read_site_settings().await?;
        assert!(settings.general.maintenance_mode);
        assert_eq!(settings.general.maintenance_message.as_deref(), Some("Migrating"));
        Ok(())
    }

    #[tokio::test]
    async fn test_synchronize_fresh_documents() -> Result<()> {
        let store = setup_sqlite_store().await?;
        let reconciler = MaintenanceReconciler::new(store.clone());

        assert!(!reconciler.synchronize(None).await?);
        assert!(!store.read_global().await?.is_active);
        assert!(!store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_force_set_overrides_both_copies() -> Result<()> {
        let store = setup_sqlite_store().await?;
        let reconciler = MaintenanceReconciler::new(store.clone());
        store.write_global(false, None, None).await?;
        store.write_site_flag(false, None).await?;

        reconciler.force_set(true, Some("admin")).await?;
        assert!(store.read_global().await?.is_active);
        assert!(store.read_site_flag().await?);

        reconciler.force_set(true, Some("admin")).await?;
        assert!(store.read_global().await?.is_active);
        assert!(store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_copies_divergent() -> Result<()> {
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        store.write_site_flag(false, None).await?;
        documents.fail_writes_to(SITE_DOC_ID).await;

        let err = reconciler.force_set(true, None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::PartialSync {
                succeeded: SyncSource::Global,
                failed: SyncSource::Site,
                ..
            }
        ));
        // The global write is not compensated
        assert!(store.read_global().await?.is_active);
        assert!(!store.read_site_flag().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_failure_aborts_before_writing() {
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store);
        documents.fail_reads.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(matches!(
            reconciler.synchronize(None).await.unwrap_err(),
            Error::StoreUnavailable { .. }
        ));
        assert_eq!(
            documents.write_calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_force_set_repairs_undecodable_copies() -> Result<()> {
        let (documents, store) = setup_fake_store();
        let reconciler = MaintenanceReconciler::new(store.clone());
        let now = Utc::now();
        documents
            .insert_raw(SETTINGS_COLLECTION, GLOBAL_DOC_ID, json!({ "isActive": "on" }), now)
            .await;
        documents
            .insert_raw(
                SETTINGS_COLLECTION,
                SITE_DOC_ID,
                json!({ "general": { "maintenanceMode": "false" } }),
                now,
            )
            .await;

        reconciler.force_set(true, Some("admin")).await?;
        assert!(store.read_global().await?.is_active);
        assert!(store.read_site_flag().await?);
        Ok(())
    }
}
