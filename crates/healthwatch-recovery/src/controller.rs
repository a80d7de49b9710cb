//! Recovery controller: restart the service when its check fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use healthwatch_alert::AlertDispatcher;
use healthwatch_alert::alert_types::{RECOVERY, RECOVERY_FAILED};
use healthwatch_core::config::RecoveryConfig;
use healthwatch_core::{CheckResult, CheckStatus, SERVICE_CHECK};
use healthwatch_health::{RestartOutcome, Supervisor};

/// Action key of the service restart.
pub const SERVICE_RESTART: &str = "service_restart";

/// What a single [`RecoveryController::maybe_recover`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// `auto_restart` is off.
    Disabled,
    /// The service check is not reporting Error.
    NotNeeded,
    /// The last attempt was less than `restart_cooldown` ago.
    CoolingDown { remaining: Duration },
    /// `max_restart_attempts` consecutive attempts did not bring the service back.
    AttemptsExhausted { attempts: u32 },
    Restarted,
    RestartFailed { reason: String },
}

/// Per-action recovery state.
#[derive(Debug, Clone, Copy)]
struct RecoveryState {
    last_attempt: Instant,
    /// Attempts since the service check last reported Ok.
    consecutive_attempts: u32,
}

pub struct RecoveryController {
    enabled: bool,
    cooldown: Duration,
    /// 0 means no cap.
    max_attempts: u32,
    supervisor: Arc<dyn Supervisor>,
    /// Action key → state.
    states: HashMap<String, RecoveryState>,
}

impl RecoveryController {
    pub fn new(config: &RecoveryConfig, supervisor: Arc<dyn Supervisor>) -> Self {
        Self {
            enabled: config.auto_restart,
            cooldown: config.restart_cooldown(),
            max_attempts: config.max_restart_attempts,
            supervisor,
            states: HashMap::new(),
        }
    }

    /// When the last restart was attempted, if ever.
    pub fn last_attempt(&self) -> Option<Instant> {
        self.states.get(SERVICE_RESTART).map(|s| s.last_attempt)
    }

    /// Restart the service if `result` reports it in Error and neither the
    /// cooldown nor the attempt cap forbids it. The attempt is recorded
    /// whatever its outcome.
    pub async fn maybe_recover(
        &mut self,
        result: &CheckResult,
        alerts: &mut AlertDispatcher,
    ) -> RecoveryOutcome {
        if !self.enabled {
            return RecoveryOutcome::Disabled;
        }

        match result.check(SERVICE_CHECK).map(|entry| entry.status) {
            Some(CheckStatus::Error) => {}
            Some(CheckStatus::Ok) => {
                if let Some(state) = self.states.get_mut(SERVICE_RESTART)
                    && state.consecutive_attempts > 0
                {
                    debug!(
                        attempts = state.consecutive_attempts,
                        "service back, resetting restart count"
                    );
                    state.consecutive_attempts = 0;
                }
                return RecoveryOutcome::NotNeeded;
            }
            _ => return RecoveryOutcome::NotNeeded,
        }

        let now = Instant::now();
        if let Some(state) = self.states.get(SERVICE_RESTART) {
            let since = now.duration_since(state.last_attempt);
            if since < self.cooldown {
                let remaining = self.cooldown - since;
                debug!(remaining_secs = remaining.as_secs(), "restart cooling down");
                return RecoveryOutcome::CoolingDown { remaining };
            }
            if self.max_attempts > 0 && state.consecutive_attempts >= self.max_attempts {
                warn!(
                    attempts = state.consecutive_attempts,
                    service = self.supervisor.service_name(),
                    "restart attempts exhausted"
                );
                return RecoveryOutcome::AttemptsExhausted {
                    attempts: state.consecutive_attempts,
                };
            }
        }

        info!(service = self.supervisor.service_name(), "attempting service restart");
        let restart = self.supervisor.restart().await;

        let state = self
            .states
            .entry(SERVICE_RESTART.to_string())
            .or_insert(RecoveryState {
                last_attempt: now,
                consecutive_attempts: 0,
            });
        state.last_attempt = now;
        state.consecutive_attempts += 1;

        match restart {
            Ok(RestartOutcome { success: true, .. }) => {
                info!(service = self.supervisor.service_name(), "service restart successful");
                alerts
                    .maybe_alert(RECOVERY, "Service automatically restarted", None)
                    .await;
                RecoveryOutcome::Restarted
            }
            Ok(RestartOutcome { stderr, .. }) => {
                let reason = format!("Service restart failed: {}", stderr.trim());
                error!(service = self.supervisor.service_name(), %stderr, "service restart failed");
                alerts.maybe_alert(RECOVERY_FAILED, &reason, None).await;
                RecoveryOutcome::RestartFailed { reason }
            }
            Err(e) => {
                let reason = format!("Recovery attempt failed: {e}");
                error!(
                    service = self.supervisor.service_name(),
                    error = %e,
                    "recovery attempt failed"
                );
                alerts.maybe_alert(RECOVERY_FAILED, &reason, None).await;
                RecoveryOutcome::RestartFailed { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthwatch_alert::{Alert, AlertSink, SinkFuture};
    use healthwatch_core::{CheckEntry, Details};
    use healthwatch_health::{ServiceState, SupervisorError, SupervisorFuture};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        ExitNonZero,
        Hang,
    }

    struct FakeSystemd {
        behaviour: Behaviour,
        restarts: AtomicU32,
    }

    impl FakeSystemd {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                restarts: AtomicU32::new(0),
            })
        }

        fn restarts(&self) -> u32 {
            self.restarts.load(Ordering::SeqCst)
        }
    }

    impl Supervisor for FakeSystemd {
        fn service_name(&self) -> &str {
            "pwnagotchi-dashboard"
        }

        fn query(&self) -> SupervisorFuture<'_, ServiceState> {
            Box::pin(async {
                Ok(ServiceState {
                    active: false,
                    status_output: String::new(),
                    return_code: Some(3),
                })
            })
        }

        fn restart(&self) -> SupervisorFuture<'_, RestartOutcome> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            let behaviour = self.behaviour;
            Box::pin(async move {
                match behaviour {
                    Behaviour::Succeed => Ok(RestartOutcome {
                        success: true,
                        stderr: String::new(),
                    }),
                    Behaviour::ExitNonZero => Ok(RestartOutcome {
                        success: false,
                        stderr: "Job for unit failed.\n".to_string(),
                    }),
                    Behaviour::Hang => Err(SupervisorError::Timeout {
                        command: "sudo systemctl restart pwnagotchi-dashboard".to_string(),
                        after: Duration::from_secs(30),
                    }),
                }
            })
        }
    }

    #[derive(Clone, Default)]
    struct Sent(Arc<Mutex<Vec<Alert>>>);

    impl AlertSink for Sent {
        fn name(&self) -> &str {
            "test"
        }

        fn send<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a> {
            Box::pin(async move {
                self.0.lock().unwrap().push(alert.clone());
                Ok(())
            })
        }
    }

    impl Sent {
        fn types(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|a| a.alert_type.clone()).collect()
        }

        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|a| a.message.clone()).collect()
        }
    }

    fn config(auto_restart: bool, max_restart_attempts: u32) -> RecoveryConfig {
        RecoveryConfig {
            auto_restart,
            max_restart_attempts,
            restart_cooldown: 600,
        }
    }

    fn with_service(status: CheckStatus) -> CheckResult {
        let checks = BTreeMap::from([(
            SERVICE_CHECK.to_string(),
            CheckEntry {
                status,
                data: Details::new(),
            },
        )]);
        CheckResult::from_checks(chrono::Utc::now(), checks)
    }

    fn alerts(sent: &Sent) -> AlertDispatcher {
        AlertDispatcher::new(Duration::ZERO).with_sink(Box::new(sent.clone()))
    }

    #[tokio::test]
    async fn disabled_never_restarts() {
        let systemd = FakeSystemd::new(Behaviour::Succeed);
        let mut recovery = RecoveryController::new(&config(false, 3), systemd.clone());
        let sent = Sent::default();

        let outcome = recovery
            .maybe_recover(&with_service(CheckStatus::Error), &mut alerts(&sent))
            .await;

        assert_eq!(outcome, RecoveryOutcome::Disabled);
        assert_eq!(systemd.restarts(), 0);
    }

    #[tokio::test]
    async fn healthy_or_missing_service_needs_nothing() {
        let systemd = FakeSystemd::new(Behaviour::Succeed);
        let mut recovery = RecoveryController::new(&config(true, 3), systemd.clone());
        let mut dispatcher = alerts(&Sent::default());

        let ok = recovery
            .maybe_recover(&with_service(CheckStatus::Ok), &mut dispatcher)
            .await;
        let empty = CheckResult::from_checks(chrono::Utc::now(), BTreeMap::new());
        let missing = recovery.maybe_recover(&empty, &mut dispatcher).await;

        assert_eq!(ok, RecoveryOutcome::NotNeeded);
        assert_eq!(missing, RecoveryOutcome::NotNeeded);
        assert_eq!(systemd.restarts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_error_within_cooldown_does_not_restart() {
        let systemd = FakeSystemd::new(Behaviour::Succeed);
        let mut recovery = RecoveryController::new(&config(true, 3), systemd.clone());
        let sent = Sent::default();
        let mut dispatcher = alerts(&sent);
        let down = with_service(CheckStatus::Error);

        let first = recovery.maybe_recover(&down, &mut dispatcher).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = recovery.maybe_recover(&down, &mut dispatcher).await;

        assert_eq!(first, RecoveryOutcome::Restarted);
        assert_eq!(
            second,
            RecoveryOutcome::CoolingDown {
                remaining: Duration::from_secs(599)
            }
        );
        assert_eq!(systemd.restarts(), 1);
        assert_eq!(sent.types(), vec![RECOVERY]);
        assert_eq!(sent.messages(), vec!["Service automatically restarted"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_restart_is_cooled_down_too() {
        let systemd = FakeSystemd::new(Behaviour::ExitNonZero);
        let mut recovery = RecoveryController::new(&config(true, 3), systemd.clone());
        let sent = Sent::default();
        let mut dispatcher = alerts(&sent);
        let down = with_service(CheckStatus::Error);

        let first = recovery.maybe_recover(&down, &mut dispatcher).await;
        tokio::time::advance(Duration::from_secs(599)).await;
        recovery.maybe_recover(&down, &mut dispatcher).await;
        assert_eq!(systemd.restarts(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        recovery.maybe_recover(&down, &mut dispatcher).await;
        assert_eq!(systemd.restarts(), 2);

        assert_eq!(
            first,
            RecoveryOutcome::RestartFailed {
                reason: "Service restart failed: Job for unit failed.".to_string()
            }
        );
        assert_eq!(sent.types(), vec![RECOVERY_FAILED, RECOVERY_FAILED]);
    }

    #[tokio::test]
    async fn supervisor_error_is_reported() {
        let systemd = FakeSystemd::new(Behaviour::Hang);
        let mut recovery = RecoveryController::new(&config(true, 3), systemd.clone());
        let sent = Sent::default();

        let outcome = recovery
            .maybe_recover(&with_service(CheckStatus::Error), &mut alerts(&sent))
            .await;

        let RecoveryOutcome::RestartFailed { reason } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(reason.starts_with("Recovery attempt failed: "), "{reason}");
        assert!(reason.contains("timed out"), "{reason}");
        assert_eq!(sent.types(), vec![RECOVERY_FAILED]);
        assert!(recovery.last_attempt().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_are_capped_until_service_recovers() {
        let systemd = FakeSystemd::new(Behaviour::ExitNonZero);
        let mut recovery = RecoveryController::new(&config(true, 2), systemd.clone());
        let mut dispatcher = alerts(&Sent::default());
        let down = with_service(CheckStatus::Error);
        let cooldown = Duration::from_secs(600);

        recovery.maybe_recover(&down, &mut dispatcher).await;
        tokio::time::advance(cooldown).await;
        recovery.maybe_recover(&down, &mut dispatcher).await;
        tokio::time::advance(cooldown).await;
        let capped = recovery.maybe_recover(&down, &mut dispatcher).await;

        assert_eq!(capped, RecoveryOutcome::AttemptsExhausted { attempts: 2 });
        assert_eq!(systemd.restarts(), 2);

        recovery
            .maybe_recover(&with_service(CheckStatus::Ok), &mut dispatcher)
            .await;
        recovery.maybe_recover(&down, &mut dispatcher).await;
        assert_eq!(systemd.restarts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_cap_means_unlimited() {
        let systemd = FakeSystemd::new(Behaviour::ExitNonZero);
        let mut recovery = RecoveryController::new(&config(true, 0), systemd.clone());
        let mut dispatcher = alerts(&Sent::default());
        let down = with_service(CheckStatus::Error);

        for _ in 0..5 {
            recovery.maybe_recover(&down, &mut dispatcher).await;
            tokio::time::advance(Duration::from_secs(600)).await;
        }
        assert_eq!(systemd.restarts(), 5);
    }
}
