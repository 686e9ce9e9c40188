//! Pushover message client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use super::NotifyClient;
use crate::shared::errors::NotifyError;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverClient {
    http_client: Client,
    url: String,
    token: String,
    user: String,
}

impl PushoverClient {
    pub fn new(token: &str, user: &str, timeout: Duration) -> Result<Self, NotifyError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            url: PUSHOVER_URL.to_string(),
            token: token.to_string(),
            user: user.to_string(),
        })
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", message),
        ];

        let response = self.http_client.post(&self.url).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("status {}: {}", status, body)));
        }

        match serde_json::from_str::<PushoverResponse>(&body) {
            Ok(reply) if reply.status == 1 => Ok(()),
            Ok(reply) => Err(NotifyError::Rejected(reply.errors.join(", "))),
            Err(e) => Err(NotifyError::Rejected(format!("unreadable reply: {}", e))),
        }
    }
}

#[async_trait]
impl NotifyClient for PushoverClient {
    async fn notify(&self, message: &str) -> bool {
        match self.send(message).await {
            Ok(()) => {
                info!("Notification sent ({} bytes)", message.len());
                true
            }
            Err(e) => {
                error!("Error sending notification: {}", e);
                false
            }
        }
    }
}
