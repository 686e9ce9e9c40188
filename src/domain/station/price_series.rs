//! Timestamp-keyed prices of one fuel at one station

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::price::PricePoint;
use crate::shared::types::Timestamp;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries {
    points: BTreeMap<Timestamp, f64>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins for an existing timestamp
    pub fn insert(&mut self, timestamp: Timestamp, price: f64) {
        self.points.insert(timestamp, price);
    }

    /// Prices with `timestamp >= since`
    pub fn since(&self, since: Timestamp) -> impl Iterator<Item = f64> + '_ {
        self.points.range(since..).map(|(_, price)| *price)
    }

    /// Point with the greatest timestamp
    pub fn latest(&self) -> Option<PricePoint> {
        self.points
            .last_key_value()
            .map(|(timestamp, price)| PricePoint::new(*timestamp, *price))
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<f64> {
        self.points.get(&timestamp).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = PricePoint> + '_ {
        self.points
            .iter()
            .map(|(timestamp, price)| PricePoint::new(*timestamp, *price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_same_timestamp() {
        let mut series = PriceSeries::new();
        series.insert(10, 1.10);
        series.insert(10, 1.20);
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(10), Some(1.20));
    }

    #[test]
    fn test_since_is_inclusive() {
        let mut series = PriceSeries::new();
        for ts in 10..20 {
            series.insert(ts, ts as f64);
        }
        for ts in 10..20 {
            let prices: Vec<f64> = series.since(ts).collect();
            assert_eq!(prices.len(), (20 - ts) as usize);
            assert_eq!(prices[0], ts as f64);
        }
        assert_eq!(series.since(20).count(), 0);
    }

    #[test]
    fn test_latest_ignores_insertion_order() {
        let mut series = PriceSeries::new();
        assert!(series.latest().is_none());

        series.insert(30, 1.3);
        series.insert(10, 1.1);
        series.insert(20, 1.2);

        assert_eq!(series.latest(), Some(PricePoint::new(30, 1.3)));
    }
}
