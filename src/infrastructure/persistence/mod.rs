//! Persistence - named byte objects and the state documents stored in them

mod file_store;
mod gcs_store;
mod memory_store;

pub use file_store::FileStore;
pub use gcs_store::GcsStore;
pub use memory_store::MemoryStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::history::PriceHistory;
use crate::domain::market::Market;
use crate::shared::errors::PersistenceError;
use crate::shared::types::RetentionWindow;

/// Store-by-name interface shared by all backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read(&self, name: &str) -> Result<Vec<u8>, PersistenceError>;

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Loads and saves the market and the price history.
///
/// Loading never fails: unreadable or corrupt state is replaced by an empty
/// instance so the cycle can go on.
pub struct StateRepository {
    store: Arc<dyn ObjectStore>,
    market_object: String,
    history_object: String,
}

impl StateRepository {
    pub fn new(store: Arc<dyn ObjectStore>, market_object: &str, history_object: &str) -> Self {
        Self {
            store,
            market_object: market_object.to_string(),
            history_object: history_object.to_string(),
        }
    }

    pub async fn load_market(&self, retention: RetentionWindow) -> Market {
        info!("Loading market from {}", self.market_object);
        match self.store.read(&self.market_object).await {
            Ok(bytes) => match Market::restore(&bytes, retention) {
                Ok(market) => market,
                Err(source) => {
                    let err = PersistenceError::Decode {
                        name: self.market_object.clone(),
                        source,
                    };
                    warn!("Error reading market from persistence: {}", err);
                    Market::new(retention)
                }
            },
            Err(err) => {
                warn!("Error reading market from persistence: {}", err);
                Market::new(retention)
            }
        }
    }

    pub async fn load_history(&self) -> PriceHistory {
        info!("Loading price history from {}", self.history_object);
        match self.store.read(&self.history_object).await {
            Ok(bytes) => match PriceHistory::restore(&bytes) {
                Ok(history) => history,
                Err(source) => {
                    let err = PersistenceError::Decode {
                        name: self.history_object.clone(),
                        source,
                    };
                    warn!("Error reading price history from persistence: {}", err);
                    PriceHistory::new()
                }
            },
            Err(err) => {
                warn!("Error reading price history from persistence: {}", err);
                PriceHistory::new()
            }
        }
    }

    pub async fn save_market(&self, market: &Market) -> Result<(), PersistenceError> {
        info!("Saving market ({} stations) to {}", market.len(), self.market_object);
        let bytes = market.snapshot()?;
        self.store.write(&self.market_object, &bytes).await
    }

    pub async fn save_history(&self, history: &PriceHistory) -> Result<(), PersistenceError> {
        info!("Saving price history ({} entries) to {}", history.len(), self.history_object);
        let bytes = history.snapshot()?;
        self.store.write(&self.history_object, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{FuelType, StationId};

    fn repository(store: Arc<MemoryStore>) -> StateRepository {
        StateRepository::new(store, "market.json", "pricehistory.json")
    }

    #[tokio::test]
    async fn test_missing_state_loads_empty() {
        let repo = repository(Arc::new(MemoryStore::new()));
        let window = RetentionWindow::from_days(2);

        let market = repo.load_market(window).await;
        assert!(market.is_empty());
        assert_eq!(market.retention(), window);
        assert!(repo.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_state_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.insert("market.json", b"{ truncated".to_vec()).await;
        store.insert("pricehistory.json", b"\"items\": 3".to_vec()).await;
        let repo = repository(store);

        assert!(repo.load_market(RetentionWindow::default()).await.is_empty());
        assert!(repo.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(store.clone());
        let id = StationId::from("A");

        let mut market = Market::default();
        market.upsert_station(&id, "Aral", "Aral Nord", "Mainz");
        market.add_price(100, &id, FuelType::E5, 1.789).unwrap();
        let mut history = PriceHistory::new();
        history.add_fuel_prices(100, FuelType::E5, &[1.789, 1.829]);

        repo.save_market(&market).await.unwrap();
        repo.save_history(&history).await.unwrap();
        assert!(store.contains("market.json").await);

        let loaded = repo.load_market(RetentionWindow::default()).await;
        assert_eq!(loaded.station(&id), market.station(&id));
        assert_eq!(repo.load_history().await, history);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let store = Arc::new(MemoryStore::read_only());
        let repo = repository(store);

        let err = repo.save_history(&PriceHistory::new()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }
}
