//! The alert payload and the sink seam.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// `source` field of every alert.
pub const ALERT_SOURCE: &str = "pwnagotchi-health-monitor";

/// One dispatched alert. Serializes to the webhook JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub alert_type: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<Value>,
    pub source: String,
}

impl Alert {
    pub fn new(alert_type: &str, message: &str, details: Option<Value>) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
            details,
            source: ALERT_SOURCE.to_string(),
        }
    }
}

/// Boxed future returned by [`AlertSink::send`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// An external channel that receives alerts.
///
/// Implementations bound their own network time; the dispatcher awaits
/// each send in turn.
pub trait AlertSink: Send + Sync {
    /// Short name used in logs (`email`, `webhook`).
    fn name(&self) -> &str;

    fn send<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a>;
}
