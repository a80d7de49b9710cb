//! Alert dispatcher: dedup, cooldown, and per-sink isolation.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use healthwatch_core::config::AlertsConfig;

use crate::email::EmailSink;
use crate::sink::{Alert, AlertSink};
use crate::webhook::WebhookSink;

/// What a single [`AlertDispatcher::maybe_alert`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The same key was sent within the cooldown.
    Suppressed,
    /// The alert was recorded and handed to every sink.
    Sent { delivered: usize, failed: usize },
}

/// Sends alerts at most once per key per cooldown window.
///
/// Owns the alert records; a single caller drives it through `&mut self`.
pub struct AlertDispatcher {
    cooldown: Duration,
    sinks: Vec<Box<dyn AlertSink>>,
    /// Alert key → when it was last sent.
    records: HashMap<String, Instant>,
}

impl AlertDispatcher {
    /// Dispatcher without sinks. Alerts are still recorded and logged.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            sinks: Vec::new(),
            records: HashMap::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Dispatcher with the email and webhook sinks that are enabled.
    ///
    /// A sink that cannot be built is logged and left out.
    pub fn from_config(config: &AlertsConfig) -> Self {
        let mut dispatcher = Self::new(config.cooldown());

        if config.email.enabled {
            dispatcher = dispatcher.with_sink(Box::new(EmailSink::new(config.email.clone())));
        }
        if config.webhook.enabled {
            match WebhookSink::from_config(&config.webhook) {
                Ok(sink) => dispatcher = dispatcher.with_sink(Box::new(sink)),
                Err(e) => error!(error = %e, "webhook sink disabled"),
            }
        }

        info!(
            sinks = dispatcher.sinks.len(),
            cooldown_secs = config.cooldown,
            "alert dispatcher ready"
        );
        dispatcher
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Number of keys currently inside their cooldown window.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Dedup key: the alert type plus a fingerprint of the message.
    pub fn alert_key(alert_type: &str, message: &str) -> String {
        let digest = Sha256::digest(message.as_bytes());
        format!("{alert_type}_{}", hex::encode(&digest[..8]))
    }

    /// Send an alert unless the same `(alert_type, message)` went out less
    /// than `cooldown` ago. Suppressed calls are dropped, not queued.
    pub async fn maybe_alert(
        &mut self,
        alert_type: &str,
        message: &str,
        details: Option<Value>,
    ) -> DispatchOutcome {
        let now = Instant::now();
        self.evict_expired(now);

        let key = Self::alert_key(alert_type, message);
        if self.records.contains_key(&key) {
            debug!(%alert_type, %message, "alert suppressed by cooldown");
            return DispatchOutcome::Suppressed;
        }
        self.records.insert(key, now);

        let alert = Alert::new(alert_type, message, details);
        let mut delivered = 0;
        let mut failed = 0;
        for sink in &self.sinks {
            // The call happens inside the async block so a panic while
            // building the future is caught as well.
            let send = AssertUnwindSafe(async { sink.send(&alert).await }).catch_unwind();
            match send.await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    error!(sink = sink.name(), %alert_type, error = %e, "alert sink failed");
                }
                Err(_) => {
                    failed += 1;
                    error!(sink = sink.name(), %alert_type, "alert sink panicked");
                }
            }
        }

        warn!(%alert_type, %message, delivered, failed, "alert sent");
        DispatchOutcome::Sent { delivered, failed }
    }

    /// Drop records whose cooldown has fully elapsed; they can no longer
    /// suppress anything.
    fn evict_expired(&mut self, now: Instant) {
        let cooldown = self.cooldown;
        self.records
            .retain(|_, last_sent| now.duration_since(*last_sent) < cooldown);
    }
}
