//! Application layer - use cases and services

pub mod commands;
pub mod cycle;
pub mod notifier;

pub use commands::{Cli, CommandExecutor, Commands};
pub use cycle::{ingest, CycleReport, FuelOutcome, PriceTracker, TrackerStats};
pub use notifier::Notifier;
