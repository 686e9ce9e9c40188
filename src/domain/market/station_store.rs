//! Keyed station store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::BestStations;
use crate::domain::price::{GoodPricePolicy, PriceAnalyzer};
use crate::domain::station::Station;
use crate::shared::errors::{MarketError, PersistenceError};
use crate::shared::types::{FuelType, RetentionWindow, StationId, Timestamp};

/// All known stations, keyed by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    #[serde(default)]
    stations: HashMap<StationId, Station>,
    #[serde(skip)]
    retention: RetentionWindow,
}

impl Market {
    pub fn new(retention: RetentionWindow) -> Self {
        Self {
            stations: HashMap::new(),
            retention,
        }
    }

    /// Decode a persisted market document
    pub fn restore(bytes: &[u8], retention: RetentionWindow) -> Result<Self, serde_json::Error> {
        let mut market: Market = serde_json::from_slice(bytes)?;
        market.retention = retention;
        Ok(market)
    }

    pub fn snapshot(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn retention(&self) -> RetentionWindow {
        self.retention
    }

    /// Insert a new station or overwrite brand, name and place of a known one
    pub fn upsert_station(&mut self, id: &StationId, brand: &str, name: &str, place: &str) {
        match self.stations.get_mut(id) {
            Some(station) => station.update(brand, name, place),
            None => {
                debug!("New station {} ({} {})", id, brand, place);
                self.stations
                    .insert(id.clone(), Station::new(id.clone(), brand, name, place));
            }
        }
    }

    /// Record where the station is and whether it is open right now
    pub fn update_status(
        &mut self,
        id: &StationId,
        lat: f64,
        lng: f64,
        is_open: bool,
    ) -> Result<(), MarketError> {
        let station = self
            .stations
            .get_mut(id)
            .ok_or_else(|| MarketError::UnknownStation(id.clone()))?;
        station.lat = lat;
        station.lng = lng;
        station.is_open = is_open;
        Ok(())
    }

    pub fn add_price(
        &mut self,
        timestamp: Timestamp,
        id: &StationId,
        fuel: FuelType,
        price: f64,
    ) -> Result<(), MarketError> {
        let station = self
            .stations
            .get_mut(id)
            .ok_or_else(|| MarketError::UnknownStation(id.clone()))?;
        station.add_price(timestamp, fuel, price);
        Ok(())
    }

    /// Every price of `fuel` with `timestamp >= since` across all stations, ascending
    pub fn all_prices(&self, fuel: FuelType, since: Timestamp) -> Vec<f64> {
        let mut prices: Vec<f64> = self
            .stations
            .values()
            .filter_map(|station| station.series(fuel))
            .flat_map(|series| series.since(since))
            .collect();
        prices.sort_by(f64::total_cmp);
        prices
    }

    /// Stations updated at `as_of` whose latest price is at or below the good price
    pub fn best_stations(&self, as_of: Timestamp, fuel: FuelType) -> BestStations {
        let prices = self.all_prices(fuel, self.retention.cutoff(as_of));
        let good_price = PriceAnalyzer::good_price(&prices);

        let stations = self
            .stations
            .iter()
            .filter(|(_, station)| {
                station.latest_price(fuel).map_or(false, |latest| {
                    latest.timestamp == as_of
                        && GoodPricePolicy::AtOrBelow.is_good(latest.value, good_price)
                })
            })
            .map(|(id, station)| (id.clone(), station.clone()))
            .collect();

        BestStations {
            fuel,
            good_price,
            stations,
        }
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new(RetentionWindow::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_TS: i64 = 1000;
    const MAX_TS: i64 = 1010;
    const FUELS: [FuelType; 2] = [FuelType::E5, FuelType::Diesel];
    const STATIONS: [&str; 2] = ["A", "B"];

    fn id(s: &str) -> StationId {
        StationId::from(s)
    }

    /// Two stations, ten prices each, falling from 10.0 to 1.0 as time advances
    fn prepare_test_market() -> (Market, Vec<f64>) {
        let window = RetentionWindow::default();
        let mut market = Market::new(window);
        let mut prices = Vec::new();

        for s in STATIONS {
            market.upsert_station(&id(s), s, s, s);
            for fuel in FUELS {
                for x in MIN_TS..MAX_TS {
                    let price = (MAX_TS - x) as f64;
                    market.add_price(window.as_seconds() + x, &id(s), fuel, price).unwrap();
                }
            }
        }
        for x in MIN_TS..MAX_TS {
            prices.push((MAX_TS - x) as f64);
        }
        prices.sort_by(f64::total_cmp);

        (market, prices)
    }

    #[test]
    fn test_upsert_overwrites_metadata_and_keeps_prices() {
        let mut market = Market::default();
        market.upsert_station(&id("A"), "Aral", "Aral Nord", "Mainz");
        market.add_price(10, &id("A"), FuelType::Diesel, 1.59).unwrap();

        market.upsert_station(&id("A"), "Shell", "Shell Süd", "Bingen");

        let station = market.station(&id("A")).unwrap();
        assert_eq!(station.brand, "Shell");
        assert_eq!(station.name, "Shell Süd");
        assert_eq!(station.place, "Bingen");
        assert_eq!(station.series(FuelType::Diesel).unwrap().get(10), Some(1.59));
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut market = Market::default();
        market.upsert_station(&id("A"), "A", "A", "A");
        let before = market.station(&id("A")).cloned();
        market.upsert_station(&id("A"), "A", "A", "A");
        assert_eq!(market.station(&id("A")).cloned(), before);
    }

    #[test]
    fn test_add_price_unknown_station() {
        let mut market = Market::default();
        market.upsert_station(&id("A"), "A", "A", "A");

        let err = market.add_price(10, &id("X"), FuelType::E5, 1.0).unwrap_err();
        assert_eq!(err, MarketError::UnknownStation(id("X")));
        assert_eq!(market.len(), 1);
        assert!(market.station(&id("X")).is_none());
        assert!(market.all_prices(FuelType::E5, 0).is_empty());
    }

    #[test]
    fn test_all_prices() {
        let (market, prices) = prepare_test_market();

        for fuel in FUELS {
            let fuel_prices = market.all_prices(fuel, 0);
            assert_eq!(fuel_prices.len(), STATIONS.len() * prices.len());

            for (index, price) in prices.iter().enumerate() {
                assert_eq!(fuel_prices[index * 2], *price);
                assert_eq!(fuel_prices[index * 2 + 1], *price);
            }
        }
        assert!(market.all_prices(FuelType::E10, 0).is_empty());
    }

    #[test]
    fn test_all_prices_since() {
        let mut market = Market::default();
        for s in STATIONS {
            market.upsert_station(&id(s), s, s, s);
            market.add_price(10, &id(s), FuelType::Diesel, 1.10).unwrap();
            market.add_price(20, &id(s), FuelType::Diesel, 1.20).unwrap();
        }

        assert_eq!(market.all_prices(FuelType::Diesel, 15), vec![1.20, 1.20]);
        assert_eq!(market.all_prices(FuelType::Diesel, 20), vec![1.20, 1.20]);
        assert_eq!(market.all_prices(FuelType::Diesel, 10).len(), 4);
    }

    #[test]
    fn test_best_stations_latest_cycle() {
        let (market, _) = prepare_test_market();
        let as_of = RetentionWindow::default().as_seconds() + MAX_TS - 1;

        for fuel in FUELS {
            // the latest price of both stations is the minimum of the window
            let best = market.best_stations(as_of, fuel);
            assert!(best.has_decision());
            assert_eq!(best.stations.len(), STATIONS.len());
        }
    }

    #[test]
    fn test_best_stations_threshold_and_freshness() {
        let now = 1_000_000;
        let mut market = Market::new(RetentionWindow::from_days(7));

        for (name, price) in [("A", 0.9), ("B", 1.0), ("C", 1.1), ("D", 1.2), ("E", 1.3)] {
            market.upsert_station(&id(name), name, name, name);
            market.add_price(now, &id(name), FuelType::E5, price).unwrap();
        }
        market.upsert_station(&id("F"), "F", "F", "F");
        market.add_price(now - 10, &id("F"), FuelType::E5, 0.9).unwrap();

        let best = market.best_stations(now, FuelType::E5);
        let expected = PriceAnalyzer::good_price(&market.all_prices(FuelType::E5, 0));
        assert!((best.good_price - expected).abs() < 1e-12);
        assert!((best.good_price - 0.903_367).abs() < 1e-5);

        assert_eq!(best.stations.len(), 1);
        assert!(best.stations.contains_key(&id("A")));
        assert!(!best.stations.contains_key(&id("F")));
    }

    #[test]
    fn test_best_stations_excludes_prices_outside_window() {
        let now = 100_000;
        let window = RetentionWindow::from_seconds(1000);
        let mut market = Market::new(window);

        market.upsert_station(&id("A"), "A", "A", "A");
        market.upsert_station(&id("B"), "B", "B", "B");
        // far outside the window, would drag the mean down
        market.add_price(now - 5000, &id("B"), FuelType::Diesel, 0.10).unwrap();
        market.add_price(now, &id("A"), FuelType::Diesel, 1.50).unwrap();

        let best = market.best_stations(now, FuelType::Diesel);
        assert_eq!(best.good_price, 1.50);
        assert!(best.stations.contains_key(&id("A")));
    }

    #[test]
    fn test_best_stations_without_prices() {
        let mut market = Market::default();
        market.upsert_station(&id("A"), "A", "A", "A");

        let best = market.best_stations(10, FuelType::E10);
        assert!(!best.has_decision());
        assert!(best.is_empty());
    }

    #[test]
    fn test_best_stations_are_snapshots() {
        let now = 50;
        let mut market = Market::default();
        market.upsert_station(&id("A"), "A", "A", "A");
        market.add_price(now, &id("A"), FuelType::E5, 1.0).unwrap();

        let best = market.best_stations(now, FuelType::E5);
        market.upsert_station(&id("A"), "changed", "changed", "changed");

        assert_eq!(best.stations[&id("A")].brand, "A");
        let (_, cheapest) = best.cheapest().unwrap();
        assert_eq!(cheapest.latest_price, 1.0);
    }

    #[test]
    fn test_update_status() {
        let mut market = Market::default();
        market.upsert_station(&id("A"), "A", "A", "A");
        market.update_status(&id("A"), 49.83, 8.12, true).unwrap();

        let station = market.station(&id("A")).unwrap();
        assert_eq!(station.lat, 49.83);
        assert!(station.is_open);
        assert!(market.update_status(&id("B"), 0.0, 0.0, true).is_err());
    }

    #[test]
    fn test_snapshot_restore() {
        let (market, _) = prepare_test_market();
        let bytes = market.snapshot().unwrap();

        let window = RetentionWindow::from_days(3);
        let restored = Market::restore(&bytes, window).unwrap();

        assert_eq!(restored.len(), market.len());
        assert_eq!(restored.retention(), window);
        for station in market.stations() {
            assert_eq!(restored.station(&station.id), Some(station));
        }
        assert!(Market::restore(b"not json", window).is_err());
    }
}
