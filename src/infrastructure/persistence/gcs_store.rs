//! Objects in a Google Cloud Storage bucket, via the JSON API

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::ObjectStore;
use crate::shared::errors::PersistenceError;

const GCS_ENDPOINT: &str = "https://storage.googleapis.com";
const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Where the bearer token of each request comes from
enum GcsAuth {
    /// Fixed token, taken as is
    Static(String),
    /// Application default credentials (service account key, gcloud login or
    /// the metadata server), resolved on first use. The provider caches the
    /// token and refreshes it once expired.
    Default(OnceCell<Arc<dyn TokenProvider>>),
}

impl GcsAuth {
    fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => GcsAuth::Static(token),
            _ => GcsAuth::Default(OnceCell::new()),
        }
    }

    async fn bearer_token(&self) -> Result<String, String> {
        match self {
            GcsAuth::Static(token) => Ok(token.clone()),
            GcsAuth::Default(provider) => {
                let provider = provider
                    .get_or_try_init(|| async {
                        let provider = gcp_auth::provider().await?;
                        info!("Using Google application default credentials");
                        Ok::<_, gcp_auth::Error>(provider)
                    })
                    .await
                    .map_err(|e| format!("no Google credentials found: {}", e))?;

                let token = provider
                    .token(&[STORAGE_SCOPE])
                    .await
                    .map_err(|e| format!("access token request failed: {}", e))?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

pub struct GcsStore {
    http_client: Client,
    endpoint: String,
    bucket: String,
    auth: GcsAuth,
}

impl GcsStore {
    /// Without `access_token` every request is authorized through the
    /// application default credentials.
    pub fn new(
        bucket: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Read {
                name: bucket.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            endpoint: GCS_ENDPOINT.to_string(),
            bucket: bucket.to_string(),
            auth: GcsAuth::from_token(access_token),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// `{endpoint}/storage/v1/b/{bucket}/o/{name}?alt=media`
    fn download_url(&self, name: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("invalid endpoint: {}", self.endpoint))?
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", name]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// `{endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={name}`
    fn upload_url(&self, name: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("invalid endpoint: {}", self.endpoint))?
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        let read_err = |reason: String| PersistenceError::Read {
            name: name.to_string(),
            reason,
        };

        let url = self.download_url(name).map_err(read_err)?;
        let token = self.auth.bearer_token().await.map_err(read_err)?;
        debug!("Downloading gs://{}/{}", self.bucket, name);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| read_err(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PersistenceError::NotFound(name.to_string())),
            status if !status.is_success() => {
                Err(read_err(format!("download failed with status: {}", status)))
            }
            _ => {
                let bytes = response.bytes().await.map_err(|e| read_err(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let write_err = |reason: String| PersistenceError::Write {
            name: name.to_string(),
            reason,
        };

        let url = self.upload_url(name).map_err(write_err)?;
        let token = self.auth.bearer_token().await.map_err(write_err)?;
        debug!("Uploading {} bytes to gs://{}/{}", bytes.len(), self.bucket, name);

        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(write_err(format!(
                "upload failed with status: {}",
                response.status()
            )));
        }
        Ok(())
    }
}
