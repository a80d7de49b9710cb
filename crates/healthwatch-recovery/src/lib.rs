//! healthwatch-recovery: automatic service restarts.
//!
//! The [`RecoveryController`] watches the `service` entry of each check
//! result. When it reports Error, the controller restarts the service
//! through the injected [`Supervisor`](healthwatch_health::Supervisor),
//! at most once per `restart_cooldown` and at most `max_restart_attempts`
//! times in a row, and reports the outcome as a `RECOVERY` or
//! `RECOVERY_FAILED` alert.

pub mod controller;

pub use controller::{RecoveryController, RecoveryOutcome, SERVICE_RESTART};
