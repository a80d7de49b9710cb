//! `service_status` probe: is the supervised service running?

use serde_json::json;
use tracing::warn;

use healthwatch_core::{Details, ProbeVerdict};

use crate::evaluator::Probe;
use crate::supervisor::Supervisor;

/// Passes iff the supervisor reports the service as active.
pub async fn probe(supervisor: &dyn Supervisor) -> ProbeVerdict {
    match supervisor.query().await {
        Ok(state) => {
            let mut detail = Details::new();
            detail.insert("active".into(), json!(state.active));
            detail.insert("status_output".into(), json!(state.status_output));
            detail.insert("return_code".into(), json!(state.return_code));
            ProbeVerdict::new(Probe::ServiceStatus.name(), state.active, detail)
        }
        Err(e) => {
            warn!(service = supervisor.service_name(), error = %e, "service query failed");
            ProbeVerdict::errored(Probe::ServiceStatus.name(), e)
        }
    }
}
