//! health_config.json loader.
//!
//! The effective config is the user's document deep-merged over the
//! serialization of [`Config::default()`], then deserialized into the typed
//! tree and validated once. Nothing downstream ever looks up a key by name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Where the daemon looks for its config when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pwnagotchi/health_config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the watched service's API; the probe requests `{api_url}/status`.
    pub api_url: String,
    pub service: ServiceConfig,
    pub checks: ChecksConfig,
    pub alerts: AlertsConfig,
    pub recovery: RecoveryConfig,
    pub metrics: MetricsConfig,
    pub scheduler: SchedulerConfig,
}

/// The supervised service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unit name as known to the process supervisor.
    pub name: String,
    /// Prefix restart commands with `sudo`.
    pub use_sudo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChecksConfig {
    pub api_response: ApiCheckConfig,
    pub cpu_usage: ThresholdCheck,
    pub memory_usage: ThresholdCheck,
    pub disk_usage: DiskCheckConfig,
    pub temperature: ThresholdCheck,
    pub process_count: ThresholdCheck,
    pub service_status: ToggleCheck,
    pub log_errors: LogCheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiCheckConfig {
    pub enabled: bool,
    /// Request timeout in seconds.
    pub timeout: f64,
    /// Maximum acceptable round-trip latency in seconds.
    pub threshold: f64,
}

/// A resource probe that passes while the sampled value stays below `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdCheck {
    pub enabled: bool,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiskCheckConfig {
    pub enabled: bool,
    pub threshold: f64,
    /// Mount point whose filesystem is sampled.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToggleCheck {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogCheckConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// How many trailing lines of the log are scanned.
    pub tail_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertsConfig {
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
    /// Seconds between two alerts sharing the same key.
    pub cooldown: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub to_emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    /// Extra headers sent with every POST.
    pub headers: BTreeMap<String, String>,
    /// Request timeout in seconds.
    pub timeout: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecoveryConfig {
    pub auto_restart: bool,
    /// Consecutive restarts allowed while the service stays down.
    pub max_restart_attempts: u32,
    /// Seconds between two restart attempts.
    pub restart_cooldown: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub retention_hours: u64,
    /// Seconds between metrics collections.
    pub collection_interval: u64,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between full check-alert-recover cycles.
    pub check_interval: u64,
    /// Seconds between liveness ticks that dispatch due work.
    pub tick_interval: u64,
}

// ── Defaults ──────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            service: ServiceConfig::default(),
            checks: ChecksConfig::default(),
            alerts: AlertsConfig::default(),
            recovery: RecoveryConfig::default(),
            metrics: MetricsConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "pwnagotchi-dashboard".to_string(),
            use_sudo: true,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            api_response: ApiCheckConfig::default(),
            cpu_usage: ThresholdCheck::enabled(90.0),
            memory_usage: ThresholdCheck::enabled(85.0),
            disk_usage: DiskCheckConfig::default(),
            temperature: ThresholdCheck::enabled(80.0),
            process_count: ThresholdCheck::enabled(500.0),
            service_status: ToggleCheck::default(),
            log_errors: LogCheckConfig::default(),
        }
    }
}

impl Default for ApiCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: 10.0,
            threshold: 5.0,
        }
    }
}

impl ThresholdCheck {
    pub fn enabled(threshold: f64) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }
}

impl Default for ThresholdCheck {
    fn default() -> Self {
        Self::enabled(90.0)
    }
}

impl Default for DiskCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 90.0,
            path: PathBuf::from("/"),
        }
    }
}

impl Default for ToggleCheck {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LogCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("/var/log/pwnagotchi/api.log"),
            tail_lines: 100,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            email: EmailConfig::default(),
            webhook: WebhookConfig::default(),
            cooldown: 300,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "localhost".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_email: "pwnagotchi@localhost".to_string(),
            to_emails: vec!["admin@localhost".to_string()],
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            headers: BTreeMap::new(),
            timeout: 10.0,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            auto_restart: true,
            max_restart_attempts: 3,
            restart_cooldown: 600,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_hours: 72,
            collection_interval: 60,
            file: PathBuf::from("/var/log/pwnagotchi/metrics.json"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: 300,
            tick_interval: 30,
        }
    }
}

// ── Derived durations ─────────────────────────────────────────────

/// Upper bound for every configured duration: 100 years.
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 3600;

impl ApiCheckConfig {
    pub fn timeout(&self) -> Duration {
        secs_f64(self.timeout, Duration::from_secs(10))
    }
}

impl ChecksConfig {
    /// Every probe switched off, thresholds left at their defaults.
    pub fn all_disabled() -> Self {
        let mut checks = Self::default();
        checks.api_response.enabled = false;
        checks.cpu_usage.enabled = false;
        checks.memory_usage.enabled = false;
        checks.disk_usage.enabled = false;
        checks.temperature.enabled = false;
        checks.process_count.enabled = false;
        checks.service_status.enabled = false;
        checks.log_errors.enabled = false;
        checks
    }

    /// Whether any of the probes folded into the `resources` entry is on.
    pub fn any_resource_enabled(&self) -> bool {
        self.cpu_usage.enabled
            || self.memory_usage.enabled
            || self.disk_usage.enabled
            || self.temperature.enabled
            || self.process_count.enabled
    }
}

impl AlertsConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        secs_f64(self.timeout, Duration::from_secs(10))
    }
}

impl RecoveryConfig {
    pub fn restart_cooldown(&self) -> Duration {
        Duration::from_secs(self.restart_cooldown)
    }
}

impl MetricsConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }

    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval)
    }
}

impl SchedulerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval)
    }
}

/// `secs` as a Duration, or `fallback` when it cannot be represented.
fn secs_f64(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(fallback)
}

// ── Loading ───────────────────────────────────────────────────────

impl Config {
    /// Load the effective config, never failing.
    ///
    /// A missing file is created with the defaults. An unreadable file or
    /// invalid JSON is logged and replaced by the defaults in memory; a
    /// value of the wrong type only loses that value.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "error loading config, using defaults");
                Self::default()
            }
        }
    }

    /// Load the effective config, surfacing read and parse errors.
    pub fn try_load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            let config = Self::default();
            match config.write_to(path) {
                Ok(()) => info!(path = %path.display(), "created default config"),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a user document and merge it over the defaults.
    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        let user: Value = serde_json::from_str(s)?;
        Self::from_user_tree(user)
    }

    /// Merge an already-parsed user tree over the defaults.
    ///
    /// A value of the wrong type is logged and dropped on its own; every
    /// other user value still applies.
    pub fn from_user_tree(user: Value) -> ConfigResult<Self> {
        let defaults = serde_json::to_value(Self::default())?;
        let merged = deep_merge(defaults.clone(), user.clone());
        let config: Self = match serde_json::from_value(merged) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "config has invalid values, dropping them");
                Self::salvage(&defaults, user)?
            }
        };
        Ok(config.validated())
    }

    /// Keep the user leaves that deserialize when merged alone over the
    /// defaults and drop the rest.
    fn salvage(defaults: &Value, user: Value) -> ConfigResult<Self> {
        let mut leaves = Vec::new();
        collect_leaves(user, &mut Vec::new(), &mut leaves);

        let mut kept = Value::Object(serde_json::Map::new());
        for (path, value) in leaves {
            let overlay = nest(&path, value);
            let merged = deep_merge(defaults.clone(), overlay.clone());
            match serde_json::from_value::<Config>(merged) {
                Ok(_) => kept = deep_merge(kept, overlay),
                Err(e) => error!(
                    key = %path.join("."),
                    error = %e,
                    "invalid config value, using default"
                ),
            }
        }

        Ok(serde_json::from_value(deep_merge(defaults.clone(), kept))?)
    }

    /// Write this config as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }

    /// Replace values that would break the engine with their defaults.
    fn validated(mut self) -> Self {
        let defaults = Self::default();
        let checks = &mut self.checks;
        let dc = &defaults.checks;

        duration_f64(
            &mut checks.api_response.timeout,
            dc.api_response.timeout,
            "checks.api_response.timeout",
        );
        duration_f64(
            &mut checks.api_response.threshold,
            dc.api_response.threshold,
            "checks.api_response.threshold",
        );
        duration_f64(
            &mut self.alerts.webhook.timeout,
            defaults.alerts.webhook.timeout,
            "alerts.webhook.timeout",
        );

        positive_f64(
            &mut checks.cpu_usage.threshold,
            dc.cpu_usage.threshold,
            "checks.cpu_usage.threshold",
        );
        positive_f64(
            &mut checks.memory_usage.threshold,
            dc.memory_usage.threshold,
            "checks.memory_usage.threshold",
        );
        positive_f64(
            &mut checks.disk_usage.threshold,
            dc.disk_usage.threshold,
            "checks.disk_usage.threshold",
        );
        positive_f64(
            &mut checks.temperature.threshold,
            dc.temperature.threshold,
            "checks.temperature.threshold",
        );
        positive_f64(
            &mut checks.process_count.threshold,
            dc.process_count.threshold,
            "checks.process_count.threshold",
        );

        duration_secs(
            &mut self.metrics.collection_interval,
            defaults.metrics.collection_interval,
            "metrics.collection_interval",
        );
        duration_secs(
            &mut self.scheduler.check_interval,
            defaults.scheduler.check_interval,
            "scheduler.check_interval",
        );
        duration_secs(
            &mut self.scheduler.tick_interval,
            defaults.scheduler.tick_interval,
            "scheduler.tick_interval",
        );
        bounded_secs(&mut self.alerts.cooldown, defaults.alerts.cooldown, "alerts.cooldown");
        bounded_secs(
            &mut self.recovery.restart_cooldown,
            defaults.recovery.restart_cooldown,
            "recovery.restart_cooldown",
        );

        let retention = &mut self.metrics.retention_hours;
        let fits = retention
            .checked_mul(3600)
            .is_some_and(|secs| secs <= MAX_DURATION_SECS);
        if *retention == 0 || !fits {
            warn!(
                key = "metrics.retention_hours",
                value = *retention,
                default = defaults.metrics.retention_hours,
                "invalid value, using default"
            );
            *retention = defaults.metrics.retention_hours;
        }

        if checks.log_errors.tail_lines == 0 {
            warn!(key = "checks.log_errors.tail_lines", "zero is not allowed, using default");
            checks.log_errors.tail_lines = dc.log_errors.tail_lines;
        }

        self
    }
}

fn positive_f64(value: &mut f64, default: f64, key: &str) {
    if !value.is_finite() || *value <= 0.0 {
        warn!(%key, value = *value, default, "invalid value, using default");
        *value = default;
    }
}

/// Positive and representable as a Duration no longer than the bound.
fn duration_f64(value: &mut f64, default: f64, key: &str) {
    let fits = value.is_finite() && *value > 0.0 && *value <= MAX_DURATION_SECS as f64;
    if !fits {
        warn!(%key, value = *value, default, "invalid duration, using default");
        *value = default;
    }
}

/// Non-zero and within the duration bound.
fn duration_secs(value: &mut u64, default: u64, key: &str) {
    if *value == 0 {
        warn!(%key, default, "zero is not allowed, using default");
        *value = default;
    }
    bounded_secs(value, default, key);
}

fn bounded_secs(value: &mut u64, default: u64, key: &str) {
    if *value > MAX_DURATION_SECS {
        warn!(%key, value = *value, default, "duration too large, using default");
        *value = default;
    }
}

/// Flatten `tree` into (key path, value) pairs. Objects are descended,
/// everything else (arrays included) is a leaf.
fn collect_leaves(tree: Value, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
    match tree {
        Value::Object(map) => {
            for (key, value) in map {
                path.push(key);
                collect_leaves(value, path, out);
                path.pop();
            }
        }
        leaf => out.push((path.clone(), leaf)),
    }
}

/// Rebuild a single leaf as a nested object along `path`.
fn nest(path: &[String], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, key| {
        let mut map = serde_json::Map::new();
        map.insert(key.clone(), inner);
        Value::Object(map)
    })
}

/// Recursively merge `overlay` into `base`.
///
/// Keys present in `overlay` win. Recursion happens only where both sides
/// hold a JSON object; any other pairing replaces the base value outright.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_recurses_into_objects() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        let overlay = json!({"a": {"y": 20}});
        assert_eq!(deep_merge(base, overlay), json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }

    #[test]
    fn deep_merge_replaces_non_objects() {
        let base = json!({"list": [1, 2, 3], "scalar": {"nested": true}});
        let overlay = json!({"list": [9], "scalar": 5, "extra": "kept"});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"list": [9], "scalar": 5, "extra": "kept"})
        );
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = Config::from_json_str(r#"{"checks": {"cpu_usage": {"threshold": 70}}}"#).unwrap();
        assert_eq!(config.checks.cpu_usage.threshold, 70.0);
        assert!(config.checks.cpu_usage.enabled);
        assert_eq!(config.checks.memory_usage.threshold, 85.0);
        assert_eq!(config.alerts.cooldown, 300);
        assert_eq!(config.api_url, "http://localhost:8080/api");
    }

    #[test]
    fn webhook_headers_merge_from_user() {
        let config = Config::from_json_str(
            r#"{"alerts": {"webhook": {"enabled": true, "url": "http://hook", "headers": {"X-Token": "abc"}}}}"#,
        )
        .unwrap();
        assert!(config.alerts.webhook.enabled);
        assert_eq!(config.alerts.webhook.headers.get("X-Token").map(String::as_str), Some("abc"));
        assert_eq!(config.alerts.webhook.timeout, 10.0);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = Config::from_json_str(
            r#"{"scheduler": {"tick_interval": 0}, "checks": {"disk_usage": {"threshold": -1}}}"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.tick_interval, 30);
        assert_eq!(config.checks.disk_usage.threshold, 90.0);
    }

    #[test]
    fn wrong_type_drops_only_that_value() {
        let config = Config::from_json_str(
            r#"{"recovery": {"auto_restart": false}, "alerts": {"cooldown": "5m", "webhook": {"url": "http://hook"}}}"#,
        )
        .unwrap();
        assert!(!config.recovery.auto_restart);
        assert_eq!(config.alerts.cooldown, 300);
        assert_eq!(config.alerts.webhook.url, "http://hook");
    }

    #[test]
    fn wrong_type_in_file_keeps_other_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health_config.json");
        std::fs::write(
            &path,
            r#"{"recovery": {"auto_restart": false}, "checks": {"cpu_usage": {"threshold": "high", "enabled": false}}}"#,
        )
        .unwrap();

        let config = Config::load(&path);
        assert!(!config.recovery.auto_restart);
        assert!(!config.checks.cpu_usage.enabled);
        assert_eq!(config.checks.cpu_usage.threshold, 90.0);
    }

    #[test]
    fn wrong_type_for_a_whole_section_falls_back_to_its_defaults() {
        let config = Config::from_json_str(r#"{"metrics": 5, "api_url": "http://pi:8080/api"}"#).unwrap();
        assert_eq!(config.metrics, MetricsConfig::default());
        assert_eq!(config.api_url, "http://pi:8080/api");
    }

    #[test]
    fn oversized_durations_fall_back_to_defaults() {
        let config = Config::from_json_str(
            r#"{"alerts": {"webhook": {"timeout": 1e20}, "cooldown": 18446744073709551615},
                "checks": {"api_response": {"timeout": 1e300}},
                "metrics": {"retention_hours": 18446744073709551615},
                "scheduler": {"check_interval": 18446744073709551615}}"#,
        )
        .unwrap();
        assert_eq!(config.alerts.webhook.timeout, 10.0);
        assert_eq!(config.alerts.webhook.timeout(), Duration::from_secs(10));
        assert_eq!(config.alerts.cooldown, 300);
        assert_eq!(config.checks.api_response.timeout(), Duration::from_secs(10));
        assert_eq!(config.metrics.retention_hours, 72);
        assert_eq!(config.scheduler.check_interval, 300);
    }

    #[test]
    fn unvalidated_durations_do_not_panic() {
        let mut config = Config::default();
        config.alerts.webhook.timeout = 1e20;
        config.checks.api_response.timeout = f64::NAN;
        config.metrics.retention_hours = u64::MAX;

        assert_eq!(config.alerts.webhook.timeout(), Duration::from_secs(10));
        assert_eq!(config.checks.api_response.timeout(), Duration::from_secs(10));
        assert_eq!(config.metrics.retention(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn load_creates_missing_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc").join("health_config.json");

        let config = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let written = Config::try_load(&path).unwrap();
        assert_eq!(written, Config::default());
    }

    #[test]
    fn load_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::try_load(&path).is_err());
        assert_eq!(Config::load(&path), Config::default());
    }

    #[test]
    fn load_existing_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health_config.json");
        std::fs::write(&path, r#"{"recovery": {"auto_restart": false}}"#).unwrap();

        let config = Config::load(&path);
        assert!(!config.recovery.auto_restart);
        assert_eq!(config.recovery.restart_cooldown, 600);
    }

    #[test]
    fn derived_durations() {
        let config = Config::default();
        assert_eq!(config.alerts.cooldown(), Duration::from_secs(300));
        assert_eq!(config.recovery.restart_cooldown(), Duration::from_secs(600));
        assert_eq!(config.metrics.retention(), Duration::from_secs(72 * 3600));
        assert_eq!(config.checks.api_response.timeout(), Duration::from_secs(10));
        assert!(config.checks.any_resource_enabled());
    }
}
