use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::shared::errors::AppError;
use crate::shared::types::{FuelType, RetentionWindow};

/// Price source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub base_url: String,
    pub api_key: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            base_url: "https://creativecommons.tankerkoenig.de/json".to_string(),
            api_key: None,
            lat: 0.0,
            lng: 0.0,
            radius_km: 5.0,
        }
    }
}

/// Pushover credentials; notifications are disabled while either is missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyCfg {
    pub token: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Gcs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    pub backend: StorageBackend,
    pub directory: PathBuf,
    pub bucket: Option<String>,
    /// Fixed GCS token; application default credentials are used without it
    pub access_token: Option<String>,
    pub market_object: String,
    pub history_object: String,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            directory: PathBuf::from("./data"),
            bucket: None,
            access_token: None,
            market_object: "market.json".to_string(),
            history_object: "pricehistory.json".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub retention_days: u32,
    pub fuels: Vec<FuelType>,
    pub http_timeout_secs: u64,
    pub source: SourceCfg,
    pub notify: NotifyCfg,
    pub storage: StorageCfg,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retention_days: RetentionWindow::DEFAULT_DAYS,
            fuels: vec![FuelType::Diesel, FuelType::E5],
            http_timeout_secs: 30,
            source: SourceCfg::default(),
            notify: NotifyCfg::default(),
            storage: StorageCfg::default(),
        }
    }
}

impl AppConfig {
    pub fn retention(&self) -> RetentionWindow {
        RetentionWindow::from_days(self.retention_days)
    }

    /// Overlay process environment variables on top of the file values
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(days) = lookup("DAYS") {
            match days.trim().parse::<u32>() {
                Ok(days) => self.retention_days = days,
                Err(e) => warn!(
                    "Ignoring DAYS={:?} ({}), keeping {} days",
                    days, e, self.retention_days
                ),
            }
        }
        if let Some(key) = lookup("API_KEY") {
            self.source.api_key = Some(key);
        }
        if let Some(lat) = lookup("LAT").and_then(|v| parse_float("LAT", &v)) {
            self.source.lat = lat;
        }
        if let Some(lng) = lookup("LNG").and_then(|v| parse_float("LNG", &v)) {
            self.source.lng = lng;
        }
        if let Some(rad) = lookup("RAD").and_then(|v| parse_float("RAD", &v)) {
            self.source.radius_km = rad;
        }
        if let Some(token) = lookup("PUSHOVER_TOKEN") {
            self.notify.token = Some(token);
        }
        if let Some(user) = lookup("PUSHOVER_USER") {
            self.notify.user = Some(user);
        }
        if let Some(bucket) = lookup("GCS_BUCKET") {
            self.storage.bucket = Some(bucket);
        }
        if let Some(token) = lookup("GCS_TOKEN") {
            self.storage.access_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.fuels.is_empty() {
            return Err(AppError::ConfigError("at least one fuel type is required".to_string()));
        }
        if self.storage.backend == StorageBackend::Gcs && self.storage.bucket.is_none() {
            return Err(AppError::ConfigError(
                "storage.bucket is required for the gcs backend".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_float(key: &str, value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("error converting {} to float: {}", key, e);
            None
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, AppError> {
        let config_content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::parse(&config_content)
    }

    pub fn parse(content: &str) -> Result<AppConfig, AppError> {
        toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// File (when given) first, then the environment on top
    pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
        let mut config = match path {
            Some(path) => Self::load_config(path)?,
            None => AppConfig::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }
}
