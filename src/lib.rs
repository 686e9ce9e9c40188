//! Fuelwatch - fuel price tracking and good-price alerts
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{CycleReport, Notifier, PriceTracker};
pub use domain::history::PriceHistory;
pub use domain::market::{BestStations, Market};
pub use domain::station::Station;
