//! healthwatch-alert: deduplicated alert fan-out.
//!
//! # Architecture
//!
//! ```text
//! AlertDispatcher::maybe_alert(type, message, details)
//!   ├── key = type + sha256(message)
//!   ├── key sent less than `cooldown` ago → suppressed (no-op)
//!   └── record key, then for each sink (isolated):
//!         ├── EmailSink   → SMTP via lettre
//!         └── WebhookSink → JSON POST via reqwest
//! ```
//!
//! A failing sink is logged and skipped; it never prevents the other
//! sinks from being tried and never surfaces to the caller.

pub mod dispatcher;
pub mod email;
pub mod sink;
pub mod webhook;

pub use dispatcher::{AlertDispatcher, DispatchOutcome};
pub use email::EmailSink;
pub use sink::{ALERT_SOURCE, Alert, AlertSink, SinkFuture};
pub use webhook::WebhookSink;

/// Alert types raised by the monitor.
pub mod alert_types {
    pub const HEALTH_CHECK_FAILED: &str = "HEALTH_CHECK_FAILED";
    pub const HEALTH_CHECK_WARNING: &str = "HEALTH_CHECK_WARNING";
    pub const RECOVERY: &str = "RECOVERY";
    pub const RECOVERY_FAILED: &str = "RECOVERY_FAILED";
}
