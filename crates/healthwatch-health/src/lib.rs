//! healthwatch-health: probes and the evaluator that folds them.
//!
//! # Architecture
//!
//! ```text
//! Evaluator::run()
//!   ├── one spawned task per enabled probe
//!   │   ├── api_response   → hyper GET {api_url}/status
//!   │   ├── cpu/memory/disk/temperature/process_count → SystemSampler
//!   │   ├── service_status → Supervisor::query()
//!   │   └── log_errors     → tail + keyword match + recency filter
//!   └── aggregate(verdicts) → CheckResult
//!         ├── "api"       (Ok | Error)
//!         ├── "resources" (Ok | Error, one sub-object per resource probe)
//!         ├── "service"   (Ok | Error)
//!         └── "logs"      (Ok | Warning)
//! ```
//!
//! A probe never fails past its boundary. Sampling errors, transport
//! failures, and even a panicking probe task all become a failed
//! [`ProbeVerdict`](healthwatch_core::ProbeVerdict) carrying `detail.error`.
//!
//! The host and the process supervisor are reached through the
//! [`SystemSampler`] and [`Supervisor`] traits so that tests can inject
//! fakes.

pub mod evaluator;
pub mod probes;
pub mod sampler;
pub mod supervisor;

pub use evaluator::{Evaluator, Probe, aggregate};
pub use sampler::{ProcSampler, SampleError, SampleFuture, SampleResult, SystemSampler};
pub use supervisor::{
    RestartOutcome, ServiceState, Supervisor, SupervisorError, SupervisorFuture, Systemctl,
};
