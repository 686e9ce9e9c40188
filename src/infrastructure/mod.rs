pub mod notify;
pub mod persistence;
pub mod price_source;
