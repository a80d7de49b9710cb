//! healthwatch-scheduler: the monitor's control loop.
//!
//! # Architecture
//!
//! ```text
//! Scheduler::run(shutdown)
//!   └── every tick_interval: dispatch whatever is due
//!         ├── metrics cadence → Monitor::collect_metrics()
//!         │     └── Evaluator::run() → MetricsStore::append()
//!         └── check cadence   → Monitor::scheduled_check()
//!               ├── Evaluator::run()
//!               ├── Unhealthy → HEALTH_CHECK_FAILED alert
//!               ├── RecoveryController::maybe_recover()
//!               └── Warning entries → HEALTH_CHECK_WARNING alert
//! ```
//!
//! Cycles run one at a time on the scheduler's task. A cycle that returns
//! an error or panics is logged and the loop goes back to idle; the next
//! due tick of every cadence still runs.

pub mod monitor;
pub mod scheduler;

pub use monitor::{CheckCycle, Monitor};
pub use scheduler::{CycleKind, Scheduler, SchedulerState};
