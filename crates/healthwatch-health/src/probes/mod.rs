//! The probe set. Each probe turns one slice of external state into a
//! [`ProbeVerdict`](healthwatch_core::ProbeVerdict) and never returns an error.

pub mod api;
pub mod logs;
pub mod resources;
pub mod service;
