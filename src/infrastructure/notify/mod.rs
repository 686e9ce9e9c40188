//! Push notification delivery

pub mod pushover;

pub use pushover::PushoverClient;

use async_trait::async_trait;

/// Delivers one text message; failures are logged by the client
#[async_trait]
pub trait NotifyClient: Send + Sync {
    async fn notify(&self, message: &str) -> bool;
}
