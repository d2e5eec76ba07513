//! Maintenance store - raw access to both copies of the maintenance flag.
//!
//! Reads self-heal missing documents by creating them with defaults. Writes go
//! straight to the document store with no retries; a failed call leaves the
//! caller to decide what to do.

use crate::{
    core::{
        document_store::DocumentStore,
        flag::{
            GLOBAL_DOC_ID, MaintenanceFlag, SETTINGS_COLLECTION, SITE_DOC_ID, SYSTEM_ACTOR,
            SiteFlagSnapshot, TimestampSource, unix_epoch,
        },
        site_settings::SiteSettings,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reads and writes the global maintenance document and the site copy of the flag.
#[derive(Clone)]
pub struct MaintenanceStore {
    documents: Arc<dyn DocumentStore>,
}

impl MaintenanceStore {
    /// Creates a store over the given document store client.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Reads the global maintenance document, creating it inactive if absent.
    #[instrument(skip(self))]
    pub async fn read_global(&self) -> Result<MaintenanceFlag> {
        let snapshot = self
            .documents
            .get_document(SETTINGS_COLLECTION, GLOBAL_DOC_ID)
            .await?;
        if let Some(data) = snapshot.data {
            return decode(GLOBAL_DOC_ID, data);
        }

        let flag = MaintenanceFlag::inactive(Utc::now());
        self.documents
            .set_document(SETTINGS_COLLECTION, GLOBAL_DOC_ID, serde_json::to_value(&flag)?)
            .await?;
        info!("Created missing global maintenance document");
        Ok(flag)
    }

    /// Upserts the global maintenance document with `updated_at = now`.
    ///
    /// A `None` message keeps whatever message the document already carries.
    /// Returns the document as it now reads.
    #[instrument(skip(self))]
    pub async fn write_global(
        &self,
        is_active: bool,
        actor: Option<&str>,
        message: Option<&str>,
    ) -> Result<MaintenanceFlag> {
        let snapshot = self
            .documents
            .get_document(SETTINGS_COLLECTION, GLOBAL_DOC_ID)
            .await?;
        let now = Utc::now();
        let updated_by = actor.unwrap_or(SYSTEM_ACTOR).to_string();

        // Only the message is carried over, so an undecodable document can still be overwritten
        let previous_message = snapshot
            .data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let flag = MaintenanceFlag {
            is_active,
            updated_at: now,
            updated_by: Some(updated_by),
            message: message.map(str::to_string).or(previous_message),
        };

        if snapshot.data.as_ref().is_some_and(Value::is_object) {
            let mut fields = Map::new();
            fields.insert("isActive".to_string(), json!(flag.is_active));
            fields.insert("updatedAt".to_string(), serde_json::to_value(flag.updated_at)?);
            fields.insert("updatedBy".to_string(), json!(flag.updated_by));
            fields.insert("message".to_string(), json!(flag.message));
            self.documents
                .update_document(SETTINGS_COLLECTION, GLOBAL_DOC_ID, Value::Object(fields))
                .await?;
        } else {
            self.documents
                .set_document(SETTINGS_COLLECTION, GLOBAL_DOC_ID, serde_json::to_value(&flag)?)
                .await?;
        }

        info!(is_active, updated_by = ?flag.updated_by, "Wrote global maintenance flag");
        Ok(flag)
    }

    /// Reads the whole site settings document, creating it from defaults if absent.
    ///
    /// Also returns the document's last-write time when the store reports one.
    #[instrument(skip(self))]
    pub async fn read_site_settings(&self) -> Result<(SiteSettings, Option<DateTime<Utc>>)> {
        let snapshot = self
            .documents
            .get_document(SETTINGS_COLLECTION, SITE_DOC_ID)
            .await?;
        if let Some(data) = snapshot.data {
            return Ok((decode(SITE_DOC_ID, data)?, snapshot.updated_at));
        }

        let settings = SiteSettings::default();
        self.documents
            .set_document(SETTINGS_COLLECTION, SITE_DOC_ID, serde_json::to_value(&settings)?)
            .await?;
        info!("Created missing site settings document from defaults");
        Ok((settings, None))
    }

    /// Returns `general.maintenanceMode` from the site settings document.
    pub async fn read_site_flag(&self) -> Result<bool> {
        let (settings, _) = self.read_site_settings().await?;
        Ok(settings.general.maintenance_mode)
    }

    /// Returns the site copy of the flag with its effective timestamp.
    ///
    /// The timestamp is `general.maintenanceUpdatedAt` when present, then the
    /// document's last-write time, then the Unix epoch.
    pub async fn read_site_snapshot(&self) -> Result<SiteFlagSnapshot> {
        let (settings, document_updated_at) = self.read_site_settings().await?;
        let (updated_at, timestamp_source) = match (
            settings.general.maintenance_updated_at,
            document_updated_at,
        ) {
            (Some(field), _) => (field, TimestampSource::Field),
            (None, Some(document)) => (document, TimestampSource::Document),
            (None, None) => (unix_epoch(), TimestampSource::Unknown),
        };
        debug!(?timestamp_source, %updated_at, "Derived site flag timestamp");
        Ok(SiteFlagSnapshot {
            is_active: settings.general.maintenance_mode,
            message: settings.general.maintenance_message,
            updated_at,
            timestamp_source,
        })
    }

    /// Overlays the maintenance flag onto the site settings and writes the
    /// whole document back.
    ///
    /// This is a read-modify-write of the entire aggregate, so a concurrent
    /// writer touching another section of the document can lose its update.
    /// A document that no longer matches [`SiteSettings`] is patched field by
    /// field instead, leaving its other sections as they are.
    #[instrument(skip(self))]
    pub async fn write_site_flag(&self, is_active: bool, message: Option<&str>) -> Result<()> {
        let snapshot = self
            .documents
            .get_document(SETTINGS_COLLECTION, SITE_DOC_ID)
            .await?;
        let now = Utc::now();

        let body = match snapshot.data {
            None => overlay_flag(SiteSettings::default(), is_active, message, now)?,
            Some(data) => match serde_json::from_value::<SiteSettings>(data.clone()) {
                Ok(settings) => overlay_flag(settings, is_active, message, now)?,
                Err(e) => {
                    warn!(error = %e, "Site settings do not decode, patching maintenance fields only");
                    patch_raw_flag(data, is_active, message, now)?
                }
            },
        };

        self.documents
            .set_document(SETTINGS_COLLECTION, SITE_DOC_ID, body)
            .await?;
        info!(is_active, "Wrote site maintenance flag");
        Ok(())
    }
}

fn overlay_flag(
    mut settings: SiteSettings,
    is_active: bool,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Value> {
    settings.general.maintenance_mode = is_active;
    settings.general.maintenance_updated_at = Some(now);
    if let Some(text) = message {
        settings.general.maintenance_message = Some(text.to_string());
    }
    Ok(serde_json::to_value(&settings)?)
}

fn patch_raw_flag(
    data: Value,
    is_active: bool,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Value> {
    let mut root = match data {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let general = root
        .entry("general")
        .or_insert_with(|| Value::Object(Map::new()));
    if !general.is_object() {
        *general = Value::Object(Map::new());
    }
    if let Value::Object(general) = general {
        general.insert("maintenanceMode".to_string(), json!(is_active));
        general.insert("maintenanceUpdatedAt".to_string(), serde_json::to_value(now)?);
        match message {
            Some(text) => {
                general.insert("maintenanceMessage".to_string(), json!(text));
            }
            None => {
                if general.get("maintenanceMessage").is_some_and(|m| !m.is_string()) {
                    general.insert("maintenanceMessage".to_string(), Value::Null);
                }
            }
        }
    }
    Ok(Value::Object(root))
}

fn decode<T: DeserializeOwned>(id: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| Error::MalformedDocument {
        collection: SETTINGS_COLLECTION.to_string(),
        id: id.to_string(),
        message: e.to_string(),
    })
}
