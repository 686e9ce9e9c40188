//! Renders the current best stations into one push message

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::market::BestStations;
use crate::domain::station::StationSummary;
use crate::infrastructure::notify::NotifyClient;
use crate::shared::types::{FuelType, StationId};
use crate::shared::utils::format_price;

pub struct Notifier {
    client: Arc<dyn NotifyClient>,
    current: BTreeMap<FuelType, BestStations>,
}

impl Notifier {
    pub fn new(client: Arc<dyn NotifyClient>) -> Self {
        Self {
            client,
            current: BTreeMap::new(),
        }
    }

    /// Replace the best stations kept for `best.fuel`
    pub fn update_best_stations(&mut self, best: BestStations) {
        debug!(
            "Notifier holds {} best stations for {}",
            best.stations.len(),
            best.fuel
        );
        self.current.insert(best.fuel, best);
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }

    /// Best stations of `fuel`, cheapest first and by id among equal prices
    pub fn ranked(&self, fuel: FuelType) -> Vec<(StationId, StationSummary)> {
        let Some(best) = self.current.get(&fuel) else {
            return Vec::new();
        };
        if !best.has_decision() {
            return Vec::new();
        }

        let mut ranked: Vec<_> = best.summaries().into_iter().collect();
        ranked.sort_by(|(id_a, a), (id_b, b)| {
            a.latest_price
                .total_cmp(&b.latest_price)
                .then_with(|| id_a.cmp(id_b))
        });
        ranked
    }

    pub fn message(&self) -> String {
        let mut message = String::new();
        for (fuel, best) in &self.current {
            for (_, summary) in self.ranked(*fuel) {
                message.push_str(&format!(
                    "Good price for {} : {}\nBest price for {} : {} \nat {} \nin {}\n\n",
                    fuel,
                    format_price(best.good_price),
                    fuel,
                    format_price(summary.latest_price),
                    summary.brand,
                    summary.place,
                ));
            }
        }
        message
    }

    pub fn has_news(&self) -> bool {
        self.current.keys().any(|fuel| !self.ranked(*fuel).is_empty())
    }

    /// Send the rendered message. Nothing is sent while no station
    /// qualifies; that counts as success.
    pub async fn notify(&self) -> bool {
        let message = self.message();
        if message.is_empty() {
            debug!("No good prices, nothing to notify");
            return true;
        }
        self.client.notify(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Market;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotifyClient for RecordingClient {
        async fn notify(&self, message: &str) -> bool {
            self.sent.lock().await.push(message.to_string());
            true
        }
    }

    fn best_for(fuel: FuelType, prices: &[(&str, f64)]) -> BestStations {
        let mut market = Market::default();
        for (id, price) in prices {
            let id = StationId::from(*id);
            market.upsert_station(&id, id.as_str(), id.as_str(), id.as_str());
            market.add_price(1, &id, fuel, *price).unwrap();
        }
        market.best_stations(1, fuel)
    }

    #[tokio::test]
    async fn test_message_format() {
        let client = Arc::new(RecordingClient::default());
        let mut notifier = Notifier::new(client.clone());

        notifier.update_best_stations(best_for(FuelType::Diesel, &[("A", 1.0)]));

        assert!(notifier.notify().await);
        let sent = client.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            ["Good price for Diesel : 1.000€\nBest price for Diesel : 1.000€ \nat A \nin A\n\n"]
        );
    }

    #[test]
    fn test_update_replaces_per_fuel() {
        let mut notifier = Notifier::new(Arc::new(RecordingClient::default()));

        for fuel in [FuelType::E5, FuelType::Diesel] {
            notifier.update_best_stations(best_for(fuel, &[("A", 1.0), ("B", 1.0), ("C", 1.0)]));
            assert_eq!(notifier.ranked(fuel).len(), 3);
        }

        notifier.update_best_stations(best_for(FuelType::E5, &[("A", 1.0)]));
        assert_eq!(notifier.ranked(FuelType::E5).len(), 1);
        assert_eq!(notifier.ranked(FuelType::Diesel).len(), 3);
    }

    #[test]
    fn test_ranking_by_price_then_id() {
        let mut notifier = Notifier::new(Arc::new(RecordingClient::default()));
        notifier.update_best_stations(best_for(
            FuelType::E10,
            &[
                ("B", 1.0),
                ("A", 1.0),
                ("C", 0.9),
                ("D", 2.0),
                ("E", 2.0),
                ("F", 2.0),
                ("G", 2.0),
                ("H", 2.0),
            ],
        ));

        let ids: Vec<String> = notifier
            .ranked(FuelType::E10)
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_fuels_in_enum_order() {
        let mut notifier = Notifier::new(Arc::new(RecordingClient::default()));
        notifier.update_best_stations(best_for(FuelType::E5, &[("A", 1.5)]));
        notifier.update_best_stations(best_for(FuelType::Diesel, &[("A", 1.4)]));

        let message = notifier.message();
        let diesel = message.find("Good price for Diesel").unwrap();
        let e5 = message.find("Good price for E5").unwrap();
        assert!(diesel < e5);
    }

    #[tokio::test]
    async fn test_nothing_sent_without_best_stations() {
        let client = Arc::new(RecordingClient::default());
        let mut notifier = Notifier::new(client.clone());

        notifier.update_best_stations(Market::default().best_stations(1, FuelType::E5));

        assert!(!notifier.has_news());
        assert!(notifier.message().is_empty());
        assert!(notifier.notify().await);
        assert!(client.sent.lock().await.is_empty());
    }
}
