//! Tankerkoenig station list client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::price::{PriceSource, StationObservation};
use crate::shared::config::SourceCfg;
use crate::shared::errors::SourceError;
use crate::shared::types::{FuelType, StationId};

/// Response of `list.php`
#[derive(Debug, Deserialize)]
struct ListResponse {
    ok: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stations: Vec<ApiStation>,
}

#[derive(Debug, Deserialize)]
struct ApiStation {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    place: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lng: f64,
    #[serde(rename = "isOpen", default)]
    is_open: bool,
    #[serde(default, deserialize_with = "price_or_false")]
    diesel: Option<f64>,
    #[serde(default, deserialize_with = "price_or_false")]
    e5: Option<f64>,
    #[serde(default, deserialize_with = "price_or_false")]
    e10: Option<f64>,
}

/// The API reports a missing price as `false` or `null` instead of omitting it
fn price_or_false<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Price(f64),
        Flag(bool),
    }

    Ok(match Option::<RawPrice>::deserialize(deserializer)? {
        Some(RawPrice::Price(price)) => Some(price),
        Some(RawPrice::Flag(_)) | None => None,
    })
}

impl From<ApiStation> for StationObservation {
    fn from(station: ApiStation) -> Self {
        let prices = HashMap::from([
            (FuelType::Diesel, station.diesel),
            (FuelType::E5, station.e5),
            (FuelType::E10, station.e10),
        ]);

        StationObservation {
            id: StationId::new(station.id),
            brand: station.brand,
            name: station.name,
            place: station.place,
            lat: station.lat,
            lng: station.lng,
            is_open: station.is_open,
            prices,
        }
    }
}

/// Lists stations around a fixed location
pub struct TankerkoenigClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    lat: f64,
    lng: f64,
    radius_km: f64,
}

impl TankerkoenigClient {
    pub fn new(cfg: &SourceCfg, timeout: Duration) -> Result<Self, SourceError> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| SourceError::Api("no API key configured".to_string()))?;

        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            lat: cfg.lat,
            lng: cfg.lng,
            radius_km: cfg.radius_km,
        })
    }

    fn parse_list(body: &str) -> Result<Vec<StationObservation>, SourceError> {
        let response: ListResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;

        if !response.ok {
            return Err(SourceError::Api(
                response.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(response.stations.into_iter().map(StationObservation::from).collect())
    }
}

#[async_trait]
impl PriceSource for TankerkoenigClient {
    async fn fetch_stations(&self) -> Result<Vec<StationObservation>, SourceError> {
        let url = format!("{}/list.php", self.base_url);
        debug!("Fetching stations from {} (lat={}, lng={}, rad={})", url, self.lat, self.lng, self.radius_km);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", self.lat.to_string()),
                ("lng", self.lng.to_string()),
                ("rad", self.radius_km.to_string()),
                ("sort", "dist".to_string()),
                ("type", "all".to_string()),
                ("apikey", self.api_key.clone()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "station list request failed with status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let stations = Self::parse_list(&body)?;
        info!("Fetched {} stations", stations.len());
        Ok(stations)
    }
}
