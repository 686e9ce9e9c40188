//! Utility functions and helpers

use crate::shared::types::Timestamp;

/// Current time as seconds since the Unix epoch
pub fn now_timestamp() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Format a price with three decimals, the way fuel prices are quoted
pub fn format_price(price: f64) -> String {
    format!("{:.3}€", price)
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
