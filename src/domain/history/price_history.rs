//! Aggregate price history per fuel

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::AggregatePrice;
use crate::domain::price::{Baseline, GoodPricePolicy};
use crate::shared::errors::PersistenceError;
use crate::shared::types::{FuelType, RetentionWindow, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    items: HashMap<FuelType, BTreeMap<Timestamp, AggregatePrice>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn snapshot(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Fold one cycle's prices into an aggregate, replacing any entry at `timestamp`
    pub fn add_fuel_prices(&mut self, timestamp: Timestamp, fuel: FuelType, prices: &[f64]) {
        let Some(baseline) = Baseline::from_prices(prices) else {
            debug!("No {} prices at {}, history unchanged", fuel, timestamp);
            return;
        };

        self.items
            .entry(fuel)
            .or_default()
            .insert(timestamp, AggregatePrice::from(baseline));
    }

    /// Whether `price` is strictly below the history's mean - stddev.
    ///
    /// Each aggregate is weighted by its `count`, approximating the average
    /// over the raw observations that are no longer kept.
    pub fn good_price(
        &self,
        fuel: FuelType,
        price: f64,
        now: Timestamp,
        retention: RetentionWindow,
    ) -> bool {
        let Some(entries) = self.items.get(&fuel) else {
            return false;
        };

        let (mut weight, mut mean_sum, mut std_dev_sum) = (0.0, 0.0, 0.0);
        for (_, aggregate) in entries.range(retention.cutoff(now)..) {
            let count = aggregate.count as f64;
            weight += count;
            mean_sum += count * aggregate.mean;
            std_dev_sum += count * aggregate.std_dev;
        }

        if weight == 0.0 {
            return false;
        }

        let good = mean_sum / weight - std_dev_sum / weight;
        GoodPricePolicy::Below.is_good(price, good)
    }

    /// Evict entries older than the window; returns how many were removed
    pub fn clean_history(
        &mut self,
        fuel: FuelType,
        now: Timestamp,
        retention: RetentionWindow,
    ) -> usize {
        let Some(entries) = self.items.get_mut(&fuel) else {
            return 0;
        };

        let before = entries.len();
        let cutoff = retention.cutoff(now);
        entries.retain(|timestamp, _| *timestamp >= cutoff);
        before - entries.len()
    }

    /// Entries for `fuel`, oldest first
    pub fn entries(&self, fuel: FuelType) -> Vec<(Timestamp, AggregatePrice)> {
        self.items
            .get(&fuel)
            .map(|entries| entries.iter().map(|(ts, a)| (*ts, *a)).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, fuel: FuelType, timestamp: Timestamp) -> Option<&AggregatePrice> {
        self.items.get(&fuel).and_then(|entries| entries.get(&timestamp))
    }

    pub fn len(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
