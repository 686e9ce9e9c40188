//! Market domain - the station store and best-station selection

mod station_store;

pub use station_store::Market;

use std::collections::BTreeMap;

use crate::domain::station::{Station, StationSummary};
use crate::shared::types::{FuelType, StationId};

/// Stations priced at or below the good price in the current cycle
#[derive(Debug, Clone)]
pub struct BestStations {
    pub fuel: FuelType,
    /// NaN when no prices fell into the window
    pub good_price: f64,
    /// Snapshots, detached from the store
    pub stations: BTreeMap<StationId, Station>,
}

impl BestStations {
    /// False when the window held no prices to derive a good price from
    pub fn has_decision(&self) -> bool {
        !self.good_price.is_nan()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn summaries(&self) -> BTreeMap<StationId, StationSummary> {
        self.stations
            .iter()
            .filter_map(|(id, station)| station.summary(self.fuel).map(|s| (id.clone(), s)))
            .collect()
    }

    /// Lowest latest price among the selected stations
    pub fn cheapest(&self) -> Option<(StationId, StationSummary)> {
        self.summaries()
            .into_iter()
            .min_by(|(_, a), (_, b)| a.latest_price.total_cmp(&b.latest_price))
    }
}
