//! Webhook sink: POSTs the alert as JSON.

use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use healthwatch_core::config::WebhookConfig;

use crate::sink::{Alert, AlertSink, SinkFuture};

pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    /// Extra headers, minus any `Content-Type` (always JSON).
    headers: Vec<(String, String)>,
}

impl WebhookSink {
    pub fn from_config(config: &WebhookConfig) -> anyhow::Result<Self> {
        if config.url.is_empty() {
            anyhow::bail!("webhook url is empty");
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("building webhook client")?;
        let headers = config
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            client,
            url: config.url.clone(),
            headers,
        })
    }
}

impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn send<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a> {
        Box::pin(async move {
            let mut request = self.client.post(&self.url).json(alert);
            for (name, value) in &self.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("POST {}", self.url))?;
            let status = response.status();
            if status.as_u16() >= 400 {
                anyhow::bail!("webhook returned {status}");
            }
            debug!(url = %self.url, %status, "webhook delivered");
            Ok(())
        })
    }
}
