//! Process supervisor access: query and restart the watched service.

use std::future::Future;
use std::pin::Pin;
use std::process::Output;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Boxed future returned by [`Supervisor`] methods.
pub type SupervisorFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, SupervisorError>> + Send + 'a>>;

/// Errors raised when a supervisor command could not be run to completion.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },
}

/// Running state of the service as reported by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
    pub active: bool,
    /// Free-form status text.
    pub status_output: String,
    pub return_code: Option<i32>,
}

/// Outcome of a restart command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartOutcome {
    pub success: bool,
    pub stderr: String,
}

/// The process supervisor managing the watched service, injected for testability.
pub trait Supervisor: Send + Sync {
    /// Name of the supervised service.
    fn service_name(&self) -> &str;

    /// Query the service's running state.
    fn query(&self) -> SupervisorFuture<'_, ServiceState>;

    /// Restart the service.
    fn restart(&self) -> SupervisorFuture<'_, RestartOutcome>;
}

/// systemd-backed supervisor driving `systemctl`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    service: String,
    use_sudo: bool,
    query_timeout: Duration,
    restart_timeout: Duration,
}

impl Systemctl {
    pub fn new(service: &str, use_sudo: bool) -> Self {
        Self {
            service: service.to_string(),
            use_sudo,
            query_timeout: Duration::from_secs(10),
            restart_timeout: Duration::from_secs(30),
        }
    }

    fn restart_argv(&self) -> Vec<&str> {
        let mut argv = Vec::with_capacity(4);
        if self.use_sudo {
            argv.push("sudo");
        }
        argv.extend(["systemctl", "restart", self.service.as_str()]);
        argv
    }
}

impl Supervisor for Systemctl {
    fn service_name(&self) -> &str {
        &self.service
    }

    fn query(&self) -> SupervisorFuture<'_, ServiceState> {
        Box::pin(async move {
            let is_active = run(
                &["systemctl", "is-active", self.service.as_str()],
                self.query_timeout,
            )
            .await?;
            let active = String::from_utf8_lossy(&is_active.stdout).trim() == "active";

            let status = run(
                &["systemctl", "status", self.service.as_str(), "--no-pager"],
                self.query_timeout,
            )
            .await?;

            Ok(ServiceState {
                active,
                status_output: String::from_utf8_lossy(&status.stdout).into_owned(),
                return_code: is_active.status.code(),
            })
        })
    }

    fn restart(&self) -> SupervisorFuture<'_, RestartOutcome> {
        Box::pin(async move {
            let output = run(&self.restart_argv(), self.restart_timeout).await?;
            Ok(RestartOutcome {
                success: output.status.success(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        })
    }
}

/// Run `argv` to completion, capturing output, bounded by `timeout`.
async fn run(argv: &[&str], timeout: Duration) -> Result<Output, SupervisorError> {
    let command = argv.join(" ");
    let Some((program, args)) = argv.split_first() else {
        return Err(SupervisorError::Spawn {
            command,
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    debug!(%command, "running supervisor command");
    let child = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SupervisorError::Spawn { command, source }),
        Err(_) => Err(SupervisorError::Timeout {
            command,
            after: timeout,
        }),
    }
}
