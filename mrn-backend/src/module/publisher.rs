///! Alert publishers
///!
///! Where rendered alert text goes. The poller only needs `post`; which
///! channel sits behind it is decided by configuration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::WebhookConfig;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn post(&self, text: &str) -> Result<()>;
}

/// Writes alerts to the log only, useful for dry runs
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn post(&self, text: &str) -> Result<()> {
        tracing::info!("Alert:\n{}", text);
        Ok(())
    }
}

/// Posts alerts as `{"text": ...}` JSON to a webhook endpoint
pub struct WebhookPublisher {
    client: Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(config: &WebhookConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn post(&self, text: &str) -> Result<()> {
        let msg_body = serde_json::json!({ "text": text });

        let response = self
            .client
            .post(&self.url)
            .json(&msg_body)
            .send()
            .await
            .context("Failed to send alert to webhook")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<Failed to read body>".to_string());
            anyhow::bail!("Webhook answered HTTP {}: {}", status, body);
        }

        tracing::info!("Alert posted to webhook. Status: {}", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_publisher_accepts_text() {
        assert!(LogPublisher.post("New session: Perseverance → MRO").await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_publisher_unreachable() {
        let config = WebhookConfig {
            url: "http://127.0.0.1:9/alerts".to_string(),
        };
        let publisher = WebhookPublisher::new(&config, Duration::from_secs(2)).unwrap();
        assert!(publisher.post("test").await.is_err());
    }
}
