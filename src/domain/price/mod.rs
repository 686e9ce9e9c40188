//! Price domain - observations and the good-price baseline

mod price_analyzer;
mod price_feed;

pub use price_analyzer::{Baseline, GoodPricePolicy, PriceAnalyzer};
pub use price_feed::{PriceSource, StationObservation};

use serde::{Deserialize, Serialize};
use crate::shared::types::Timestamp;

/// Price observed at one cycle timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl PricePoint {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}
