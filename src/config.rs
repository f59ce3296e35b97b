//! Runtime configuration, read from `~/.preplist/config.json`.
//!
//! Every field has a default, so a missing file is the same as `{}`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PrepError;
use crate::priority::{Classifier, DEFAULT_CRITICAL_ITEMS};

pub const DEFAULT_ESTIMATED_TIME: u32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Database file. Defaults to `~/.preplist/preplist.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    /// Ingredients that always go to tier A when below PAR.
    #[serde(default = "default_critical_items")]
    pub critical_items: Vec<String>,
    /// Prep minutes assumed for items created without an estimate.
    #[serde(default = "default_estimated_time")]
    pub default_estimated_time: u32,
    /// Kitchen's offset from UTC, used to decide which service day "today" is.
    #[serde(default)]
    pub timezone_offset_minutes: i32,
}

fn default_critical_items() -> Vec<String> {
    DEFAULT_CRITICAL_ITEMS.iter().map(|s| s.to_string()).collect()
}

fn default_estimated_time() -> u32 {
    DEFAULT_ESTIMATED_TIME
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            critical_items: default_critical_items(),
            default_estimated_time: DEFAULT_ESTIMATED_TIME,
            timezone_offset_minutes: 0,
        }
    }
}

impl Config {
    pub fn classifier(&self) -> Classifier {
        Classifier::new(&self.critical_items)
    }

    /// The kitchen's current calendar date.
    pub fn today(&self) -> Result<NaiveDate, PrepError> {
        let offset = FixedOffset::east_opt(self.timezone_offset_minutes.saturating_mul(60))
            .ok_or_else(|| {
                PrepError::Configuration(format!(
                    "timezoneOffsetMinutes out of range: {}",
                    self.timezone_offset_minutes
                ))
            })?;
        Ok(Utc::now().with_timezone(&offset).date_naive())
    }
}

/// Path of the config file: `~/.preplist/config.json`.
pub fn config_path() -> Result<PathBuf, PrepError> {
    let home = dirs::home_dir()
        .ok_or_else(|| PrepError::Configuration("Could not find home directory".into()))?;
    Ok(home.join(".preplist").join("config.json"))
}

/// Load the config from its default location.
pub fn load_config() -> Result<Config, PrepError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, PrepError> {
    if !path.exists() {
        log::debug!("No config at {}; using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| PrepError::Configuration(format!("Failed to read config: {}", e)))?;

    let config: Config = serde_json::from_str(&content)
        .map_err(|e| PrepError::Configuration(format!("Failed to parse config: {}", e)))?;

    if config.default_estimated_time == 0 {
        return Err(PrepError::Configuration(
            "defaultEstimatedTime must be at least 1 minute".into(),
        ));
    }

    Ok(config)
}
