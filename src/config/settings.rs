//! Application settings loaded from config.toml
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use crate::core::gate::{DEFAULT_MAINTENANCE_MESSAGE, MaintenanceGate};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Maintenance gate and polling settings
    pub maintenance: MaintenanceConfig,
    /// Site identity
    pub site: SiteConfig,
}

/// `[maintenance]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Banner shown on the maintenance screen
    pub default_message: String,
    /// How often the global document is polled for external changes
    pub poll_interval_secs: u64,
    /// Commands that stay available during maintenance
    pub exempt_commands: Vec<String>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_MAINTENANCE_MESSAGE.to_string(),
            poll_interval_secs: 30,
            exempt_commands: vec!["login".to_string(), "ping".to_string()],
        }
    }
}

impl MaintenanceConfig {
    /// Poll interval as a [`Duration`], never shorter than one second.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Builds the navigation gate described by this table.
    #[must_use]
    pub fn gate(&self) -> MaintenanceGate {
        MaintenanceGate::new(self.exempt_commands.clone(), self.default_message.clone())
    }
}

/// `[site]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// Name used in bot replies
    pub site_name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Fact Check".to_string(),
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads `./config.toml`, falling back to defaults when the file is absent.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        info!("No config.toml found, using default configuration");
        Ok(AppConfig::default())
    }
}
