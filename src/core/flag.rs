//! Maintenance flag data model.
//!
//! The flag lives in two places: a dedicated global document and a boolean
//! nested inside the site settings aggregate. The types here describe both
//! copies as they are read back from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection holding both maintenance documents
pub const SETTINGS_COLLECTION: &str = "settings";
/// Id of the dedicated global maintenance document
pub const GLOBAL_DOC_ID: &str = "maintenance";
/// Id of the site settings aggregate document
pub const SITE_DOC_ID: &str = "site";
/// Actor recorded when no user is attached to a write
pub const SYSTEM_ACTOR: &str = "system";

/// The global maintenance document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceFlag {
    /// Whether the site is in maintenance; a missing field reads as off
    #[serde(default)]
    pub is_active: bool,
    /// Last write time, used as the tie-breaker when reconciling
    #[serde(default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
    /// Actor identifier or `"system"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// User-facing maintenance banner text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MaintenanceFlag {
    /// The document written when the global flag is read for the first time.
    #[must_use]
    pub fn inactive(now: DateTime<Utc>) -> Self {
        Self {
            is_active: false,
            updated_at: now,
            updated_by: Some(SYSTEM_ACTOR.to_string()),
            message: None,
        }
    }
}

/// Where the effective timestamp of the site copy came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampSource {
    /// `general.maintenanceUpdatedAt` was present
    Field,
    /// Fell back to the site document's own last-write time
    Document,
    /// No timestamp available; treated as the Unix epoch
    Unknown,
}

/// The site copy of the flag together with its effective timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteFlagSnapshot {
    /// `general.maintenanceMode`
    pub is_active: bool,
    /// `general.maintenanceMessage`
    pub message: Option<String>,
    /// Effective last write time of the flag
    pub updated_at: DateTime<Utc>,
    /// How `updated_at` was derived
    pub timestamp_source: TimestampSource,
}

/// One of the two physical copies of the flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    /// The dedicated global document
    Global,
    /// `general.maintenanceMode` in the site settings document
    Site,
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Site => f.write_str("site"),
        }
    }
}

pub(crate) const fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
