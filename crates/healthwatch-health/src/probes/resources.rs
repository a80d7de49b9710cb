//! Host resource probes: cpu, memory, disk, temperature, process count.
//!
//! Every resource probe passes iff the sampled value is strictly below its
//! threshold. A sample that could not be taken fails the probe with an
//! `error` detail.

use serde_json::{Value, json};
use tracing::warn;

use healthwatch_core::config::{DiskCheckConfig, ThresholdCheck};
use healthwatch_core::{Details, ProbeVerdict};

use crate::evaluator::Probe;
use crate::sampler::{SampleResult, SystemSampler};

pub async fn cpu_usage(sampler: &dyn SystemSampler, check: &ThresholdCheck) -> ProbeVerdict {
    let sampled = sampler.cpu_percent().await.map(|v| (v, json!(v)));
    threshold_verdict(Probe::CpuUsage, "usage", sampled, check.threshold)
}

pub async fn memory_usage(sampler: &dyn SystemSampler, check: &ThresholdCheck) -> ProbeVerdict {
    let sampled = sampler.memory_percent().await.map(|v| (v, json!(v)));
    threshold_verdict(Probe::MemoryUsage, "usage", sampled, check.threshold)
}

pub async fn disk_usage(sampler: &dyn SystemSampler, check: &DiskCheckConfig) -> ProbeVerdict {
    let sampled = sampler.disk_percent(&check.path).await.map(|v| (v, json!(v)));
    threshold_verdict(Probe::DiskUsage, "usage", sampled, check.threshold)
}

pub async fn temperature(sampler: &dyn SystemSampler, check: &ThresholdCheck) -> ProbeVerdict {
    let sampled = sampler.temperature().await.map(|v| (v, json!(v)));
    threshold_verdict(Probe::Temperature, "value", sampled, check.threshold)
}

pub async fn process_count(sampler: &dyn SystemSampler, check: &ThresholdCheck) -> ProbeVerdict {
    let sampled = sampler
        .process_count()
        .await
        .map(|n| (n as f64, json!(n)));
    threshold_verdict(Probe::ProcessCount, "count", sampled, check.threshold)
}

/// Build a verdict from a sample: `(value used for comparison, value shown)`.
pub fn threshold_verdict(
    probe: Probe,
    key: &str,
    sampled: SampleResult<(f64, Value)>,
    threshold: f64,
) -> ProbeVerdict {
    let mut detail = Details::new();
    detail.insert("threshold".into(), json!(threshold));

    match sampled {
        Ok((value, shown)) => {
            let ok = value < threshold;
            detail.insert(key.into(), shown);
            detail.insert("ok".into(), json!(ok));
            ProbeVerdict::new(probe.name(), ok, detail)
        }
        Err(e) => {
            warn!(probe = probe.name(), error = %e, "sampling failed");
            detail.insert("ok".into(), json!(false));
            detail.insert("error".into(), json!(e.to_string()));
            ProbeVerdict::new(probe.name(), false, detail)
        }
    }
}
