use std::env;
use std::fmt;
use std::time::Duration;

use config::{Config as ConfigSource, ConfigError, Environment, File};
use serde::Deserialize;

use crate::supervisor::GuardianDirective;

#[derive(Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings { level: default_log_level(), color: default_true() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// The Node's configuration surface: compiled-in defaults, an optional file
/// named by `CORVID_CONF` (default `config/corvid.toml`), then `CORVID__...`
/// environment overrides layered last — the same three-tier shape the
/// lineage's own `load_config` uses, just routed through the `config` crate
/// instead of hand-rolled TOML merging.
#[derive(Clone, Deserialize)]
pub struct SystemSettings {
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    #[serde(default = "default_high_water_ratio")]
    pub mailbox_high_water_ratio: f64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    #[serde(default = "default_guardian_directive")]
    pub guardian_directive: String,
    #[serde(default)]
    pub log: LogSettings,
}

fn default_mailbox_capacity() -> usize {
    100_000
}

fn default_high_water_ratio() -> f64 {
    0.9
}

fn default_heartbeat_interval_ms() -> u64 {
    1_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    5_000
}

fn default_max_inflight() -> usize {
    1_000
}

fn default_guardian_directive() -> String {
    "restart".to_string()
}

impl Default for SystemSettings {
    fn default() -> Self {
        SystemSettings {
            mailbox_capacity: default_mailbox_capacity(),
            mailbox_high_water_ratio: default_high_water_ratio(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            max_inflight: default_max_inflight(),
            guardian_directive: default_guardian_directive(),
            log: LogSettings::default(),
        }
    }
}

impl SystemSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn high_water_mark(&self) -> usize {
        ((self.mailbox_capacity as f64) * self.mailbox_high_water_ratio) as usize
    }

    pub fn guardian_directive(&self) -> GuardianDirective {
        GuardianDirective::parse(&self.guardian_directive).unwrap_or(GuardianDirective::Restart)
    }
}

#[derive(Debug)]
pub struct SettingsError(ConfigError);

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to load configuration: {}", self.0)
    }
}

impl std::error::Error for SettingsError {}

/// Loads `SystemSettings`. File named by `CORVID_CONF` (default
/// `config/corvid.toml`) is optional; `CORVID__...` environment overrides
/// always apply last, e.g. `CORVID__MAX_INFLIGHT=5000`.
pub fn load_settings() -> Result<SystemSettings, SettingsError> {
    let path = env::var("CORVID_CONF").unwrap_or_else(|_| "config/corvid.toml".into());

    let source = ConfigSource::builder()
        .add_source(File::with_name(&path).required(false))
        .add_source(Environment::with_prefix("CORVID").separator("__"))
        .build()
        .map_err(SettingsError)?;

    source.try_deserialize().map_err(SettingsError)
}
