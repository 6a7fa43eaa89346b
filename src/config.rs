use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::elements::celestrak_url;
use crate::tracker::{
    StalenessCheck, TrackSettings, DEFAULT_NORAD_ID, DEFAULT_ORBIT_DURATION_MINUTES,
    DEFAULT_STALENESS_THRESHOLD_DAYS, DEFAULT_UPDATE_INTERVAL,
};

// One week of one-minute samples.
const MAX_ORBIT_DURATION_MINUTES: u32 = 7 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub satellite: SatelliteConfig,
    pub tracking: TrackingConfig,
    pub map: MapConfig,
    pub web: Option<WebConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SatelliteConfig {
    pub norad_id: u32,
    pub tle_file: PathBuf,
    /// Defaults to the CelesTrak GP query for `norad_id`.
    pub tle_url: Option<String>,
}

impl Default for SatelliteConfig {
    fn default() -> Self {
        Self {
            norad_id: DEFAULT_NORAD_ID,
            tle_file: PathBuf::from("data_files/iss_zarya_tle.tle"),
            tle_url: None,
        }
    }
}

impl SatelliteConfig {
    pub fn tle_url(&self) -> String {
        self.tle_url
            .clone()
            .unwrap_or_else(|| celestrak_url(self.norad_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub orbit_duration_minutes: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub update_interval: Duration,
    pub staleness_threshold_days: f64,
    pub staleness_check: StalenessCheck,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            orbit_duration_minutes: DEFAULT_ORBIT_DURATION_MINUTES,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            staleness_threshold_days: DEFAULT_STALENESS_THRESHOLD_DAYS,
            staleness_check: StalenessCheck::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("map/tracker_map.html"),
            zoom: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Values taken from the command line or the environment; they win over
/// the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub orbit_duration_minutes: Option<u32>,
    pub update_interval_seconds: Option<u64>,
    pub staleness_threshold_days: Option<f64>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document is a valid "all defaults" configuration.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load `path` if given, apply `overrides` and validate the result.
    pub fn load(path: Option<&str>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        let tracking = &mut self.tracking;
        if let Some(minutes) = overrides.orbit_duration_minutes {
            tracking.orbit_duration_minutes = minutes;
        }
        if let Some(seconds) = overrides.update_interval_seconds {
            tracking.update_interval = Duration::from_secs(seconds);
        }
        if let Some(days) = overrides.staleness_threshold_days {
            tracking.staleness_threshold_days = days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tracking = &self.tracking;
        if !(1..=MAX_ORBIT_DURATION_MINUTES).contains(&tracking.orbit_duration_minutes) {
            return Err(ConfigError::Invalid(format!(
                "orbit_duration_minutes must be between 1 and {}",
                MAX_ORBIT_DURATION_MINUTES
            )));
        }
        if tracking.update_interval.is_zero() {
            return Err(ConfigError::Invalid("update_interval must not be zero".into()));
        }
        let threshold = tracking.staleness_threshold_days;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(ConfigError::Invalid(
                "staleness_threshold_days must be positive".into(),
            ));
        }
        if !self.map.enabled && self.web.is_none() {
            return Err(ConfigError::Invalid(
                "nothing to publish to: enable the map file or the web view".into(),
            ));
        }
        Ok(())
    }

    pub fn track_settings(&self) -> TrackSettings {
        TrackSettings {
            norad_id: self.satellite.norad_id,
            orbit_duration_minutes: self.tracking.orbit_duration_minutes,
            update_interval: self.tracking.update_interval,
            staleness_threshold_days: self.tracking.staleness_threshold_days,
            staleness_check: self.tracking.staleness_check,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}
