//! Extension pour intégrer la grille de programmes dans pmoconfig
//!
//! Ce module fournit le trait `ScheduleConfigExt` qui ajoute à
//! `pmoconfig::Config` les clés de la section `schedule` (source HTTP,
//! zone de référence, stockage des grilles, génération).
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmoschedule::ScheduleConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = get_config().get_schedule_settings()?;
//! println!("Schedule from {}", settings.url);
//! # Ok(())
//! # }
//! ```

use crate::client::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCHEDULE_URL};
use crate::generator::DEFAULT_MAX_ITEM_SECS;
use crate::instant::{zone_from_offset_minutes, DEFAULT_ZONE_OFFSET_MINUTES};
use anyhow::Result;
use chrono::FixedOffset;
use pmoconfig::Config;
use serde::{Deserialize, Serialize};
use serde_yaml::{Number, Value};
use std::time::Duration;

/// Default refresh cadence (hourly)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Default span served by `GET /schedule`
pub const DEFAULT_WINDOW_HOURS: u64 = 3;

pub const DEFAULT_STORE_DIRECTORY: &str = "schedules";
pub const DEFAULT_CATALOG_FILE: &str = "catalog.json";

/// Schedule settings, detached from the global configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "ScheduleSettings::default_url")]
    pub url: String,
    #[serde(default = "ScheduleSettings::default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "ScheduleSettings::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "ScheduleSettings::default_zone_offset_minutes")]
    pub zone_offset_minutes: i64,
    #[serde(default = "ScheduleSettings::default_window_hours")]
    pub window_hours: u64,
    #[serde(default = "ScheduleSettings::default_max_item_secs")]
    pub max_item_secs: u64,
}

impl ScheduleSettings {
    fn default_url() -> String {
        DEFAULT_SCHEDULE_URL.to_string()
    }

    const fn default_refresh_interval_secs() -> u64 {
        DEFAULT_REFRESH_INTERVAL_SECS
    }

    const fn default_request_timeout_secs() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_SECS
    }

    const fn default_zone_offset_minutes() -> i64 {
        DEFAULT_ZONE_OFFSET_MINUTES
    }

    const fn default_window_hours() -> u64 {
        DEFAULT_WINDOW_HOURS
    }

    fn default_max_item_secs() -> u64 {
        DEFAULT_MAX_ITEM_SECS as u64
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn zone(&self) -> crate::Result<FixedOffset> {
        zone_from_offset_minutes(self.zone_offset_minutes)
    }

    /// Window span in seconds
    pub fn window_secs(&self) -> f64 {
        (self.window_hours * 3600) as f64
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            refresh_interval_secs: Self::default_refresh_interval_secs(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            zone_offset_minutes: Self::default_zone_offset_minutes(),
            window_hours: Self::default_window_hours(),
            max_item_secs: Self::default_max_item_secs(),
        }
    }
}

/// Trait d'extension pour la section `schedule` de pmoconfig
///
/// Les getters persistent la valeur par défaut quand la clé est absente.
pub trait ScheduleConfigExt {
    /// URL de la grille publiée
    fn get_schedule_url(&self) -> Result<String>;
    fn set_schedule_url(&self, url: &str) -> Result<()>;

    /// Décalage de la zone de référence, en minutes à l'est d'UTC
    fn get_schedule_zone_offset_minutes(&self) -> Result<i64>;
    fn set_schedule_zone_offset_minutes(&self, minutes: i64) -> Result<()>;

    /// Répertoire des grilles journalières (créé si besoin)
    fn get_schedule_store_dir(&self) -> Result<String>;

    /// Fichier catalogue des vidéos, résolu par rapport au répertoire de config
    fn get_schedule_catalog_path(&self) -> Result<String>;

    /// Toutes les valeurs de la section, typées
    fn get_schedule_settings(&self) -> Result<ScheduleSettings>;
}

fn get_u64_or_default(config: &Config, path: &[&str], default: u64) -> Result<u64> {
    match config.get_value(path) {
        Ok(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64().unwrap_or(default)),
        Ok(other) if !other.is_null() => {
            tracing::warn!(key = %path.join("."), value = ?other, "Invalid value, using default {}", default);
            Ok(default)
        }
        _ => {
            config.set_value(path, Value::Number(Number::from(default)))?;
            Ok(default)
        }
    }
}

impl ScheduleConfigExt for Config {
    fn get_schedule_url(&self) -> Result<String> {
        match self.get_value(&["schedule", "url"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            _ => {
                self.set_schedule_url(DEFAULT_SCHEDULE_URL)?;
                Ok(DEFAULT_SCHEDULE_URL.to_string())
            }
        }
    }

    fn set_schedule_url(&self, url: &str) -> Result<()> {
        self.set_value(&["schedule", "url"], Value::String(url.to_string()))
    }

    fn get_schedule_zone_offset_minutes(&self) -> Result<i64> {
        match self.get_value(&["schedule", "zone_offset_minutes"]) {
            Ok(Value::Number(n)) if n.as_i64().is_some() => {
                Ok(n.as_i64().unwrap_or(DEFAULT_ZONE_OFFSET_MINUTES))
            }
            _ => {
                self.set_schedule_zone_offset_minutes(DEFAULT_ZONE_OFFSET_MINUTES)?;
                Ok(DEFAULT_ZONE_OFFSET_MINUTES)
            }
        }
    }

    fn set_schedule_zone_offset_minutes(&self, minutes: i64) -> Result<()> {
        self.set_value(
            &["schedule", "zone_offset_minutes"],
            Value::Number(Number::from(minutes)),
        )
    }

    fn get_schedule_store_dir(&self) -> Result<String> {
        self.get_managed_dir(&["schedule", "store_directory"], DEFAULT_STORE_DIRECTORY)
    }

    fn get_schedule_catalog_path(&self) -> Result<String> {
        let file = match self.get_value(&["schedule", "catalog"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => {
                self.set_value(
                    &["schedule", "catalog"],
                    Value::String(DEFAULT_CATALOG_FILE.to_string()),
                )?;
                DEFAULT_CATALOG_FILE.to_string()
            }
        };
        Ok(self.resolve_path(&file))
    }

    fn get_schedule_settings(&self) -> Result<ScheduleSettings> {
        Ok(ScheduleSettings {
            url: self.get_schedule_url()?,
            refresh_interval_secs: get_u64_or_default(
                self,
                &["schedule", "refresh_interval_secs"],
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            request_timeout_secs: get_u64_or_default(
                self,
                &["schedule", "request_timeout_secs"],
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            zone_offset_minutes: self.get_schedule_zone_offset_minutes()?,
            window_hours: get_u64_or_default(self, &["schedule", "window_hours"], DEFAULT_WINDOW_HOURS)?,
            max_item_secs: get_u64_or_default(
                self,
                &["schedule", "max_item_secs"],
                DEFAULT_MAX_ITEM_SECS as u64,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::load_config(&dir.path().to_string_lossy()).unwrap()
    }

    #[test]
    fn test_settings_from_embedded_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = config(&dir).get_schedule_settings().unwrap();
        assert_eq!(settings, ScheduleSettings::default());
        assert_eq!(settings.zone().unwrap().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_url_override_is_persisted() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        config.set_schedule_url("http://example.test/schedule").unwrap();
        assert_eq!(config.get_schedule_url().unwrap(), "http://example.test/schedule");
    }

    #[test]
    fn test_store_dir_is_created_under_config_dir() {
        let dir = TempDir::new().unwrap();
        let store = config(&dir).get_schedule_store_dir().unwrap();
        assert!(std::path::Path::new(&store).is_dir());
        assert!(store.ends_with("schedules"));
    }

    #[test]
    fn test_catalog_path_is_resolved() {
        let dir = TempDir::new().unwrap();
        let path = config(&dir).get_schedule_catalog_path().unwrap();
        assert_eq!(
            std::path::Path::new(&path),
            dir.path().join(DEFAULT_CATALOG_FILE)
        );
    }

    #[test]
    fn test_settings_defaults_from_empty_yaml() {
        let settings: ScheduleSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, ScheduleSettings::default());
    }
}
