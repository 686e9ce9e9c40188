//! Error handling for the application

use thiserror::Error;

use crate::shared::types::StationId;

/// Station store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Unknown station: {0}")]
    UnknownStation(StationId),
}

/// Persistence-related errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to read {name}: {reason}")]
    Read { name: String, reason: String },

    #[error("Failed to write {name}: {reason}")]
    Write { name: String, reason: String },

    #[error("Failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Price source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price source rejected the request: {0}")]
    Api(String),

    #[error("Invalid price data: {0}")]
    Decode(String),
}

/// Notification errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Price source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] PersistenceError),
}
