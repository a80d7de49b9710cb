//! Evaluator: runs the enabled probes and folds them into one [`CheckResult`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use healthwatch_core::config::ChecksConfig;
use healthwatch_core::{
    API_CHECK, CheckEntry, CheckResult, CheckStatus, Config, Details, LOGS_CHECK, ProbeVerdict,
    RESOURCES_CHECK, SERVICE_CHECK,
};

use crate::probes;
use crate::sampler::{ProcSampler, SystemSampler};
use crate::supervisor::{Supervisor, Systemctl};

/// The individual probes, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    ApiResponse,
    CpuUsage,
    MemoryUsage,
    DiskUsage,
    Temperature,
    ProcessCount,
    ServiceStatus,
    LogErrors,
}

impl Probe {
    pub const ALL: [Probe; 8] = [
        Probe::ApiResponse,
        Probe::CpuUsage,
        Probe::MemoryUsage,
        Probe::DiskUsage,
        Probe::Temperature,
        Probe::ProcessCount,
        Probe::ServiceStatus,
        Probe::LogErrors,
    ];

    /// Verdict name, matching the probe's key under `checks` in the config.
    pub fn name(self) -> &'static str {
        match self {
            Probe::ApiResponse => "api_response",
            Probe::CpuUsage => "cpu_usage",
            Probe::MemoryUsage => "memory_usage",
            Probe::DiskUsage => "disk_usage",
            Probe::Temperature => "temperature",
            Probe::ProcessCount => "process_count",
            Probe::ServiceStatus => "service_status",
            Probe::LogErrors => "log_errors",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Sub-object key inside the `resources` entry, for resource probes.
    pub fn resource_key(self) -> Option<&'static str> {
        match self {
            Probe::CpuUsage => Some("cpu"),
            Probe::MemoryUsage => Some("memory"),
            Probe::DiskUsage => Some("disk"),
            Probe::Temperature => Some("temperature"),
            Probe::ProcessCount => Some("processes"),
            _ => None,
        }
    }

    fn enabled_in(self, checks: &ChecksConfig) -> bool {
        match self {
            Probe::ApiResponse => checks.api_response.enabled,
            Probe::CpuUsage => checks.cpu_usage.enabled,
            Probe::MemoryUsage => checks.memory_usage.enabled,
            Probe::DiskUsage => checks.disk_usage.enabled,
            Probe::Temperature => checks.temperature.enabled,
            Probe::ProcessCount => checks.process_count.enabled,
            Probe::ServiceStatus => checks.service_status.enabled,
            Probe::LogErrors => checks.log_errors.enabled,
        }
    }
}

/// Runs the enabled subset of the probe set.
#[derive(Clone)]
pub struct Evaluator {
    api_url: Arc<str>,
    checks: Arc<ChecksConfig>,
    sampler: Arc<dyn SystemSampler>,
    supervisor: Arc<dyn Supervisor>,
}

impl Evaluator {
    pub fn new(
        api_url: &str,
        checks: ChecksConfig,
        sampler: Arc<dyn SystemSampler>,
        supervisor: Arc<dyn Supervisor>,
    ) -> Self {
        Self {
            api_url: Arc::from(api_url),
            checks: Arc::new(checks),
            sampler,
            supervisor,
        }
    }

    /// Evaluator over the real host, supervising `config.service` via systemctl.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.api_url,
            config.checks.clone(),
            Arc::new(ProcSampler::default()),
            Arc::new(Systemctl::new(&config.service.name, config.service.use_sudo)),
        )
    }

    pub fn supervisor(&self) -> Arc<dyn Supervisor> {
        Arc::clone(&self.supervisor)
    }

    pub fn enabled_probes(&self) -> Vec<Probe> {
        Probe::ALL
            .into_iter()
            .filter(|p| p.enabled_in(&self.checks))
            .collect()
    }

    /// Run every enabled probe concurrently and aggregate the verdicts.
    ///
    /// Each probe runs in its own task; a panicking probe yields a failed
    /// verdict for that probe only.
    pub async fn run(&self) -> CheckResult {
        let timestamp = Utc::now();
        let handles: Vec<(Probe, JoinHandle<ProbeVerdict>)> = self
            .enabled_probes()
            .into_iter()
            .map(|probe| (probe, self.spawn_probe(probe)))
            .collect();

        let mut verdicts = Vec::with_capacity(handles.len());
        for (probe, handle) in handles {
            let verdict = match handle.await {
                Ok(verdict) => verdict,
                Err(e) => {
                    error!(probe = probe.name(), error = %e, "probe task failed");
                    ProbeVerdict::errored(probe.name(), format!("probe task failed: {e}"))
                }
            };
            debug!(probe = %verdict.name, ok = verdict.ok, "probe finished");
            verdicts.push(verdict);
        }

        aggregate(timestamp, verdicts)
    }

    fn spawn_probe(&self, probe: Probe) -> JoinHandle<ProbeVerdict> {
        let checks = Arc::clone(&self.checks);
        let sampler = Arc::clone(&self.sampler);
        let supervisor = Arc::clone(&self.supervisor);
        let api_url = Arc::clone(&self.api_url);

        tokio::spawn(async move {
            let sampler = sampler.as_ref();
            match probe {
                Probe::ApiResponse => probes::api::probe(&api_url, &checks.api_response).await,
                Probe::CpuUsage => probes::resources::cpu_usage(sampler, &checks.cpu_usage).await,
                Probe::MemoryUsage => {
                    probes::resources::memory_usage(sampler, &checks.memory_usage).await
                }
                Probe::DiskUsage => {
                    probes::resources::disk_usage(sampler, &checks.disk_usage).await
                }
                Probe::Temperature => {
                    probes::resources::temperature(sampler, &checks.temperature).await
                }
                Probe::ProcessCount => {
                    probes::resources::process_count(sampler, &checks.process_count).await
                }
                Probe::ServiceStatus => probes::service::probe(supervisor.as_ref()).await,
                Probe::LogErrors => {
                    probes::logs::probe(&checks.log_errors, Local::now().naive_local()).await
                }
            }
        })
    }
}

/// Fold verdicts into check entries.
///
/// `api` and `service` map one to one; the resource probes share the
/// `resources` entry (Error if any of them failed); `log_errors` becomes
/// the `logs` entry and can only reach Warning. Verdicts with unknown
/// names are ignored.
pub fn aggregate(
    timestamp: chrono::DateTime<Utc>,
    verdicts: impl IntoIterator<Item = ProbeVerdict>,
) -> CheckResult {
    let mut checks = BTreeMap::new();
    let mut resources = Details::new();
    let mut resources_ok = true;

    for verdict in verdicts {
        let Some(probe) = Probe::from_name(&verdict.name) else {
            continue;
        };
        let verdict_status = if verdict.ok {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        };

        if let Some(key) = probe.resource_key() {
            resources_ok &= verdict.ok;
            resources.insert(key.to_string(), Value::Object(verdict.detail));
            continue;
        }

        let (entry_name, status) = match probe {
            Probe::ApiResponse => (API_CHECK, verdict_status),
            Probe::ServiceStatus => (SERVICE_CHECK, verdict_status),
            Probe::LogErrors if verdict.ok => (LOGS_CHECK, CheckStatus::Ok),
            Probe::LogErrors => (LOGS_CHECK, CheckStatus::Warning),
            _ => continue,
        };
        checks.insert(
            entry_name.to_string(),
            CheckEntry {
                status,
                data: verdict.detail,
            },
        );
    }

    if !resources.is_empty() {
        let status = if resources_ok {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        };
        checks.insert(
            RESOURCES_CHECK.to_string(),
            CheckEntry {
                status,
                data: resources,
            },
        );
    }

    CheckResult::from_checks(timestamp, checks)
}
