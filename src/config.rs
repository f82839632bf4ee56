//! Device configuration
//!
//! Build- and provisioning-time parameters of the orchestrator.  Stored as
//! JSON (`device.json`) in the file store; missing fields take their
//! defaults so older files keep loading.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::{FileStore, StorageError};

/// File holding the serialised [`DeviceConfig`].
pub const CONFIG_FILE: &str = "device.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    NotFound,
    IoError,
    /// Stored document is not valid JSON for this schema.
    ParseFailed,
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored configuration"),
            Self::IoError => write!(f, "I/O error"),
            Self::ParseFailed => write!(f, "malformed configuration"),
            Self::ValidationFailed(why) => write!(f, "invalid configuration: {why}"),
        }
    }
}

/// Core orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Identity ---
    /// Login presented to the sync collaborators
    pub device_login: String,
    /// Password presented to the sync collaborators
    pub device_pass: String,
    /// Firmware version reported to the update trigger
    pub project_version: String,
    /// Capability document pushed once at startup
    pub description: Option<String>,

    // --- Startup ---
    /// Clock synchronisation attempts at startup
    pub clock_sync_attempts: u8,
    /// Window (seconds) for an operator to keep the device in Configure mode
    pub interactive_override_secs: u32,

    // --- Cycles ---
    /// Sleep between Configure cycles (seconds)
    pub configure_period_secs: u32,
    /// Upper bound for any computed sleep (seconds)
    pub sleep_horizon_secs: i64,
    /// Catch-up iterations allowed per actor per cycle
    pub max_catch_up_per_cycle: u32,
    /// Push buffered logs every N Configure cycles (0 = never)
    pub log_push_every: u32,

    // --- Console ---
    /// Initial log level, 0 (debug) to 3 (error)
    pub log_level: u8,
    /// Allow `cat` to print stored files
    pub insecure: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_login: String::from("device"),
            device_pass: String::new(),
            project_version: env!("CARGO_PKG_VERSION").to_owned(),
            description: None,

            clock_sync_attempts: 3,
            interactive_override_secs: 3,

            configure_period_secs: 4,
            sleep_horizon_secs: 2 * 24 * 3600, // 2 days
            max_catch_up_per_cycle: 1024,
            log_push_every: 8,

            log_level: 1,
            insecure: false,
        }
    }
}

impl DeviceConfig {
    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_version.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("project_version is empty"));
        }
        if self.clock_sync_attempts == 0 {
            return Err(ConfigError::ValidationFailed("clock_sync_attempts must be >= 1"));
        }
        if self.configure_period_secs == 0 {
            return Err(ConfigError::ValidationFailed("configure_period_secs must be > 0"));
        }
        if self.sleep_horizon_secs <= 0 {
            return Err(ConfigError::ValidationFailed("sleep_horizon_secs must be > 0"));
        }
        if self.max_catch_up_per_cycle == 0 {
            return Err(ConfigError::ValidationFailed("max_catch_up_per_cycle must be >= 1"));
        }
        if self.log_level > 3 {
            return Err(ConfigError::ValidationFailed("log_level must be 0..=3"));
        }
        Ok(())
    }

    /// Load and validate [`CONFIG_FILE`] from `fs`.
    pub fn load(fs: &dyn FileStore) -> Result<Self, ConfigError> {
        let raw = fs.read(CONFIG_FILE).map_err(|e| match e {
            StorageError::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|_| ConfigError::ParseFailed)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate, then persist to [`CONFIG_FILE`].
    pub fn save(&self, fs: &mut dyn FileStore) -> Result<(), ConfigError> {
        self.validate()?;
        let raw = serde_json::to_string(self).map_err(|_| ConfigError::ParseFailed)?;
        fs.write(CONFIG_FILE, &raw).map_err(|_| ConfigError::IoError)
    }
}
