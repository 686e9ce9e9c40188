//! Price source interface

use async_trait::async_trait;
use std::collections::HashMap;

use crate::shared::errors::SourceError;
use crate::shared::types::{FuelType, StationId};

/// One station as reported by the price source in a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct StationObservation {
    pub id: StationId,
    pub brand: String,
    pub name: String,
    pub place: String,
    pub lat: f64,
    pub lng: f64,
    pub is_open: bool,
    /// Missing entries and `None` both mean the fuel was not observed
    pub prices: HashMap<FuelType, Option<f64>>,
}

impl StationObservation {
    pub fn price(&self, fuel: FuelType) -> Option<f64> {
        self.prices.get(&fuel).copied().flatten()
    }
}

/// Price source interface
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_stations(&self) -> Result<Vec<StationObservation>, SourceError>;
}
