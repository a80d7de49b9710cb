//! healthwatch-core: shared data model and configuration.
//!
//! Every other healthwatch crate speaks in these types: a probe produces a
//! [`ProbeVerdict`], the evaluator folds verdicts into one [`CheckResult`],
//! and the rest of the engine consumes that result by reference.
//!
//! [`Config`] is loaded once at startup by deep-merging the user's JSON
//! document over the compiled-in defaults, then frozen.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, deep_merge};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
