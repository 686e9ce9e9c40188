//! History domain - long-horizon aggregate price statistics

mod price_history;

pub use price_history::PriceHistory;

use serde::{Deserialize, Serialize};

use crate::domain::price::Baseline;

/// Summary of one fuel's prices across all stations at one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatePrice {
    pub mean: f64,
    pub std_dev: f64,
    /// Number of observations behind `mean` and `std_dev`
    pub count: usize,
}

impl From<Baseline> for AggregatePrice {
    fn from(baseline: Baseline) -> Self {
        Self {
            mean: baseline.mean,
            std_dev: baseline.std_dev,
            count: baseline.count,
        }
    }
}
