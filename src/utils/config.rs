//! Configuration and constants for the grouping engine.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Current group report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default database location used by the CLI
pub const DEFAULT_DB_PATH: &str = "crashgroup.db";

/// How long a connection waits on a locked database before giving up
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for a group description, in characters
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 8192;

// Log markers
pub const APP_INFO_HEADER: &str = "Application Specific Information:";

/// PLCrashReporter's own exception handler; shows up in the crashed
/// thread but is never application code.
pub const TRAMPOLINE_FRAME: &str = "uncaught_exception_handler (PLCrashReporter.m:";

/// Tweak injection library present on jailbroken devices
pub const JAILBREAK_MARKER: &str = "MobileSubstrate";

/// Patterns starting with a raw address never came from a symbolicated frame
pub const UNSYMBOLICATED_PREFIX: &str = "0x00";

/// Runtime settings loaded from TOML
///
/// **Public** - passed to every command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Accept crashes from any bundle, not only the listed apps
    #[serde(default)]
    pub accept_all_apps: bool,

    /// Maximum description length enforced by the merger
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Known applications
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

/// One configured application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEntry {
    pub bundle_identifier: String,

    /// Display name shown in reports
    #[serde(default)]
    pub name: Option<String>,

    /// Whether signature extraction runs for this app
    #[serde(default = "default_grouping")]
    pub grouping: bool,
}

/// Effective policy for one bundle identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPolicy {
    pub accepted: bool,
    pub grouping_enabled: bool,
    pub display_name: Option<String>,
}

fn default_max_description_len() -> usize {
    DEFAULT_MAX_DESCRIPTION_LEN
}

fn default_grouping() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accept_all_apps: true,
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
            apps: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    /// * `ConfigError::Io` - file cannot be read
    /// * `ConfigError::Toml` - file is not valid TOML for `Settings`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Resolve the policy for a bundle identifier
    ///
    /// **Public** - consulted by ingest before anything is stored
    pub fn policy_for(&self, bundle_identifier: &str) -> AppPolicy {
        match self
            .apps
            .iter()
            .find(|app| app.bundle_identifier == bundle_identifier)
        {
            Some(app) => AppPolicy {
                accepted: true,
                grouping_enabled: app.grouping,
                display_name: app.name.clone(),
            },
            None => AppPolicy {
                accepted: self.accept_all_apps,
                grouping_enabled: self.accept_all_apps,
                display_name: None,
            },
        }
    }
}
