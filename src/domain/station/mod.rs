//! Station domain - station records and their price series

mod price_series;

pub use price_series::PriceSeries;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::price::PricePoint;
use crate::shared::types::{FuelType, StationId, Timestamp};

/// A gas station with its price history per fuel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub brand: String,
    pub name: String,
    /// City name
    pub place: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub prices: BTreeMap<FuelType, PriceSeries>,
}

impl Station {
    pub fn new(id: StationId, brand: &str, name: &str, place: &str) -> Self {
        let prices = FuelType::ALL
            .iter()
            .map(|fuel| (*fuel, PriceSeries::new()))
            .collect();

        Self {
            id,
            brand: brand.to_string(),
            name: name.to_string(),
            place: place.to_string(),
            lat: 0.0,
            lng: 0.0,
            is_open: false,
            prices,
        }
    }

    pub fn update(&mut self, brand: &str, name: &str, place: &str) {
        self.brand = brand.to_string();
        self.name = name.to_string();
        self.place = place.to_string();
    }

    pub fn add_price(&mut self, timestamp: Timestamp, fuel: FuelType, price: f64) {
        self.prices.entry(fuel).or_default().insert(timestamp, price);
    }

    pub fn series(&self, fuel: FuelType) -> Option<&PriceSeries> {
        self.prices.get(&fuel)
    }

    pub fn prices_since(&self, since: Timestamp, fuel: FuelType) -> Vec<f64> {
        self.series(fuel)
            .map(|series| series.since(since).collect())
            .unwrap_or_default()
    }

    pub fn latest_price(&self, fuel: FuelType) -> Option<PricePoint> {
        self.series(fuel).and_then(PriceSeries::latest)
    }

    pub fn summary(&self, fuel: FuelType) -> Option<StationSummary> {
        self.latest_price(fuel).map(|latest| StationSummary {
            brand: self.brand.clone(),
            name: self.name.clone(),
            place: self.place.clone(),
            latest_price: latest.value,
        })
    }
}

/// What the notifier needs to know about a station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub brand: String,
    pub name: String,
    pub place: String,
    pub latest_price: f64,
}
