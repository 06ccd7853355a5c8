//! Configuration of the synchronisation layer.
//!
//! [`SyncSettings`] is the typed view used by the loops; [`SyncConfigExt`]
//! reads it from the `sync` section of `pmoconfig`.

use crate::constants::{
    COMMAND_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DRIFT_TOLERANCE_SECS, FAST_POLL_INTERVAL_MS,
    NEAR_END_SECS, STALL_RELOAD_THRESHOLD,
};
use anyhow::Result;
use pmoconfig::Config;
use pmoschedule::Seconds;
use serde::{Deserialize, Serialize};
use serde_yaml::{Number, Value};
use std::time::Duration;

/// Default number of displayed channels
pub const DEFAULT_CHANNELS: u64 = 4;

/// Loop parameters shared by every channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "SyncSettings::default_channels")]
    pub channels: u64,
    #[serde(default = "SyncSettings::default_interval_ms")]
    pub default_interval_ms: u64,
    #[serde(default = "SyncSettings::default_fast_interval_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "SyncSettings::default_drift_tolerance_secs")]
    pub drift_tolerance_secs: u64,
    #[serde(default = "SyncSettings::default_stall_reload_threshold")]
    pub stall_reload_threshold: u64,
    #[serde(default = "SyncSettings::default_near_end_secs")]
    pub near_end_secs: u64,
    #[serde(default = "SyncSettings::default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl SyncSettings {
    const fn default_channels() -> u64 {
        DEFAULT_CHANNELS
    }

    const fn default_interval_ms() -> u64 {
        DEFAULT_POLL_INTERVAL_MS
    }

    const fn default_fast_interval_ms() -> u64 {
        FAST_POLL_INTERVAL_MS
    }

    fn default_drift_tolerance_secs() -> u64 {
        DRIFT_TOLERANCE_SECS as u64
    }

    const fn default_stall_reload_threshold() -> u64 {
        STALL_RELOAD_THRESHOLD as u64
    }

    fn default_near_end_secs() -> u64 {
        NEAR_END_SECS as u64
    }

    const fn default_command_timeout_ms() -> u64 {
        COMMAND_TIMEOUT_MS
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    pub fn fast_interval(&self) -> Duration {
        Duration::from_millis(self.fast_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn drift_tolerance(&self) -> Seconds {
        self.drift_tolerance_secs as Seconds
    }

    pub fn near_end(&self) -> Seconds {
        self.near_end_secs as Seconds
    }

    pub fn channel_count(&self) -> usize {
        self.channels as usize
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            channels: Self::default_channels(),
            default_interval_ms: Self::default_interval_ms(),
            fast_interval_ms: Self::default_fast_interval_ms(),
            drift_tolerance_secs: Self::default_drift_tolerance_secs(),
            stall_reload_threshold: Self::default_stall_reload_threshold(),
            near_end_secs: Self::default_near_end_secs(),
            command_timeout_ms: Self::default_command_timeout_ms(),
        }
    }
}

/// Trait d'extension pour la section `sync` de pmoconfig
pub trait SyncConfigExt {
    /// Paramètres des boucles de synchronisation
    ///
    /// Les clés absentes sont complétées et persistées avec leur valeur par défaut.
    fn get_sync_settings(&self) -> Result<SyncSettings>;

    fn set_sync_default_interval_ms(&self, interval_ms: u64) -> Result<()>;
}

impl SyncConfigExt for Config {
    fn get_sync_settings(&self) -> Result<SyncSettings> {
        let value = match self.get_value(&["sync"]) {
            Ok(value @ Value::Mapping(_)) => value,
            _ => {
                let value = serde_yaml::to_value(SyncSettings::default())?;
                self.set_value(&["sync"], value.clone())?;
                value
            }
        };

        let settings = match serde_yaml::from_value(value) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("Invalid sync section ({}), using defaults", err);
                SyncSettings::default()
            }
        };

        Ok(settings)
    }

    fn set_sync_default_interval_ms(&self, interval_ms: u64) -> Result<()> {
        self.set_value(
            &["sync", "default_interval_ms"],
            Value::Number(Number::from(interval_ms)),
        )
    }
}
