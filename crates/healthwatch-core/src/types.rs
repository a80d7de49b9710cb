//! Data model shared by the probes, the evaluator, and the consumers of
//! a check result.
//!
//! All types serialize to the JSON shape printed by `--check` and
//! persisted in the metrics file.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured detail attached to a verdict or check entry.
pub type Details = serde_json::Map<String, Value>;

/// Check entry names as they appear in a [`CheckResult`].
pub const API_CHECK: &str = "api";
pub const RESOURCES_CHECK: &str = "resources";
pub const SERVICE_CHECK: &str = "service";
pub const LOGS_CHECK: &str = "logs";

// ── Verdict ───────────────────────────────────────────────────────

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeVerdict {
    pub name: String,
    pub ok: bool,
    pub detail: Details,
}

impl ProbeVerdict {
    pub fn new(name: &str, ok: bool, detail: Details) -> Self {
        Self {
            name: name.to_string(),
            ok,
            detail,
        }
    }

    /// A failed verdict whose only detail is the failure description.
    pub fn errored(name: &str, error: impl fmt::Display) -> Self {
        let mut detail = Details::new();
        detail.insert("error".to_string(), Value::String(error.to_string()));
        Self::new(name, false, detail)
    }

    /// The `detail.error` field, if the probe recorded one.
    pub fn error(&self) -> Option<&str> {
        self.detail.get("error").and_then(Value::as_str)
    }
}

// ── Check result ──────────────────────────────────────────────────

/// Per-check status inside a [`CheckResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// Aggregate status of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Unhealthy,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => f.write_str("ok"),
            CheckStatus::Warning => f.write_str("warning"),
            CheckStatus::Error => f.write_str("error"),
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Healthy => f.write_str("healthy"),
            OverallStatus::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

/// One named entry of a check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub status: CheckStatus,
    pub data: Details,
}

/// Aggregated outcome of one evaluation cycle.
///
/// Built once by the evaluator and never mutated afterwards; consumers
/// receive it by reference or take ownership of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub timestamp: DateTime<Utc>,
    pub overall_status: OverallStatus,
    pub checks: BTreeMap<String, CheckEntry>,
}

impl CheckResult {
    /// Build a result, deriving `overall_status` from the entries:
    /// unhealthy iff any entry reports `Error`.
    pub fn from_checks(timestamp: DateTime<Utc>, checks: BTreeMap<String, CheckEntry>) -> Self {
        let overall_status = if checks.values().any(|c| c.status == CheckStatus::Error) {
            OverallStatus::Unhealthy
        } else {
            OverallStatus::Healthy
        };
        Self {
            timestamp,
            overall_status,
            checks,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == OverallStatus::Healthy
    }

    pub fn check(&self, name: &str) -> Option<&CheckEntry> {
        self.checks.get(name)
    }

    /// Names of all entries with the given status, in key order.
    pub fn names_with(&self, status: CheckStatus) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
