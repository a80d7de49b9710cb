//! Monitor: owns the engine components and implements the cycle bodies.

use anyhow::Context;
use tracing::info;

use healthwatch_alert::AlertDispatcher;
use healthwatch_alert::alert_types::{HEALTH_CHECK_FAILED, HEALTH_CHECK_WARNING};
use healthwatch_core::{CheckResult, CheckStatus, Config};
use healthwatch_health::Evaluator;
use healthwatch_metrics::MetricsStore;
use healthwatch_recovery::{RecoveryController, RecoveryOutcome};

/// Outcome of one scheduled check cycle.
#[derive(Debug, Clone)]
pub struct CheckCycle {
    pub result: CheckResult,
    pub recovery: RecoveryOutcome,
}

/// The evaluator plus the three stateful consumers of its results.
///
/// All mutable state (alert records, recovery state, metrics window) is
/// owned here and touched only through `&mut self`.
pub struct Monitor {
    evaluator: Evaluator,
    alerts: AlertDispatcher,
    recovery: RecoveryController,
    metrics: MetricsStore,
}

impl Monitor {
    pub fn new(
        evaluator: Evaluator,
        alerts: AlertDispatcher,
        recovery: RecoveryController,
        metrics: MetricsStore,
    ) -> Self {
        Self {
            evaluator,
            alerts,
            recovery,
            metrics,
        }
    }

    /// Monitor over the real host, with sinks, recovery and history per `config`.
    pub async fn from_config(config: &Config) -> Self {
        let evaluator = Evaluator::from_config(config);
        let recovery = RecoveryController::new(&config.recovery, evaluator.supervisor());
        let alerts = AlertDispatcher::from_config(&config.alerts);
        let metrics = MetricsStore::open(&config.metrics.file, config.metrics.retention()).await;
        Self::new(evaluator, alerts, recovery, metrics)
    }

    pub fn alerts(&self) -> &AlertDispatcher {
        &self.alerts
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    /// Evaluate and append the result to the metrics history.
    pub async fn collect_metrics(&mut self) -> anyhow::Result<CheckResult> {
        let result = self.evaluator.run().await;
        self.metrics
            .append(result.clone())
            .await
            .context("persisting metrics")?;
        Ok(result)
    }

    /// Evaluate, alert on failures and warnings, and attempt recovery.
    pub async fn scheduled_check(&mut self) -> anyhow::Result<CheckCycle> {
        let result = self.evaluator.run().await;
        info!(
            status = %result.overall_status,
            checks = result.checks.len(),
            "scheduled health check"
        );

        let details = serde_json::to_value(&result).context("encoding check result")?;

        if !result.is_healthy() {
            let failed = result.names_with(CheckStatus::Error).join(", ");
            self.alerts
                .maybe_alert(
                    HEALTH_CHECK_FAILED,
                    &format!("Health check failed: {failed}"),
                    Some(details.clone()),
                )
                .await;
        }

        // Also runs on healthy results so a recovered service resets the attempt count.
        let recovery = self.recovery.maybe_recover(&result, &mut self.alerts).await;

        let warnings = result.names_with(CheckStatus::Warning);
        if !warnings.is_empty() {
            self.alerts
                .maybe_alert(
                    HEALTH_CHECK_WARNING,
                    &format!("Health check warnings: {}", warnings.join(", ")),
                    Some(details),
                )
                .await;
        }

        Ok(CheckCycle { result, recovery })
    }
}
