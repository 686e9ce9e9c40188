//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds since the Unix epoch
pub type Timestamp = i64;

/// Seconds per day, used to turn the configured retention into seconds
pub const DAY_SECONDS: i64 = 86_400;

/// Unique station identifier as delivered by the price source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fuel types prices are segmented by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelType {
    Diesel,
    E5,
    E10,
}

impl FuelType {
    pub const ALL: [FuelType; 3] = [FuelType::Diesel, FuelType::E5, FuelType::E10];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Diesel => "Diesel",
            FuelType::E5 => "E5",
            FuelType::E10 => "E10",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diesel" => Ok(FuelType::Diesel),
            "e5" => Ok(FuelType::E5),
            "e10" => Ok(FuelType::E10),
            other => Err(format!("unknown fuel type: {}", other)),
        }
    }
}

/// Trailing time span for statistics and eviction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    seconds: i64,
}

impl RetentionWindow {
    pub const DEFAULT_DAYS: u32 = 7;

    pub fn from_days(days: u32) -> Self {
        Self {
            seconds: i64::from(days) * DAY_SECONDS,
        }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> i64 {
        self.seconds
    }

    /// Oldest timestamp still inside the window ending at `now`
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now - self.seconds
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::from_days(Self::DEFAULT_DAYS)
    }
}
