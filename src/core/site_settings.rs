//! Site settings aggregate.
//!
//! The site document bundles unrelated configuration (general site identity,
//! content rules, email templates) with the nested `general.maintenanceMode`
//! copy of the maintenance flag. It is always read and written as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full site settings document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    /// Site identity and the maintenance copy
    pub general: GeneralSettings,
    /// Publishing and moderation rules
    pub content: ContentRules,
    /// Outgoing email templates
    pub email: EmailTemplates,
}

/// `general` section of the site settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    /// Public site name
    pub site_name: String,
    /// Short tagline shown in the header
    pub site_description: String,
    /// Contact address shown in the footer
    pub contact_email: String,
    /// Site copy of the maintenance flag
    pub maintenance_mode: bool,
    /// Banner text shown on the maintenance screen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_message: Option<String>,
    /// Last time `maintenance_mode` was written; absent in older documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_updated_at: Option<DateTime<Utc>>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            site_name: "Fact Check".to_string(),
            site_description: "Independent claim verification".to_string(),
            contact_email: "contact@example.org".to_string(),
            maintenance_mode: false,
            maintenance_message: None,
            maintenance_updated_at: None,
        }
    }
}

/// `content` section of the site settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentRules {
    /// Articles must cite sources before publishing
    pub require_sources: bool,
    /// Minimum number of cited sources
    pub min_sources: u32,
    /// Readers may comment on articles
    pub allow_comments: bool,
    /// Comments wait for moderator approval
    pub moderate_comments: bool,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            require_sources: true,
            min_sources: 2,
            allow_comments: true,
            moderate_comments: true,
        }
    }
}

/// `email` section of the site settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailTemplates {
    /// Subject of the welcome email
    pub welcome_subject: String,
    /// Body of the welcome email
    pub welcome_body: String,
    /// Subject of the "verdict published" notification
    pub verdict_published_subject: String,
    /// Body of the "verdict published" notification
    pub verdict_published_body: String,
}

impl Default for EmailTemplates {
    fn default() -> Self {
        Self {
            welcome_subject: "Welcome".to_string(),
            welcome_body: "Thanks for joining us.".to_string(),
            verdict_published_subject: "A claim you follow has a verdict".to_string(),
            verdict_published_body: "Read the full analysis on the site.".to_string(),
        }
    }
}
