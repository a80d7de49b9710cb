//! healthwatch-metrics: time-bounded history of check results.
//!
//! # Architecture
//!
//! ```text
//! MetricsStore
//!   ├── open()   → load the persisted window once at startup, prune it
//!   └── append() → push entry, prune by age, rewrite the whole file
//!                  (temp file + rename)
//! ```
//!
//! The persisted file is a JSON array of `{timestamp, results}` entries
//! and always mirrors the in-memory window after a successful append.

pub mod error;
pub mod store;

pub use error::{MetricsError, MetricsResult};
pub use store::{MetricsEntry, MetricsStore};
