//! Domain layer - core business logic and entities

pub mod history;
pub mod market;
pub mod price;
pub mod station;
