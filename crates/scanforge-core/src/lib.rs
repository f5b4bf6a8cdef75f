//! Core domain model, error taxonomy, and `Store` contract for the
//! scanforge CI security-analysis orchestrator.
//!
//! # Modules
//!
//! - [`model`] — `Repository`, `Analysis`, `ScanDefinition`, `ScanRun`,
//!   `Vulnerability`, `VulnerabilityBucket` (spec §3).
//! - [`error`] — the error taxonomy (spec §7).
//! - [`store`] — the `Store` contract the dispatcher consumes (spec §6).
//! - [`template`] — command-templating (spec §4.3).
//! - [`validate`] — intake validation (spec §4.7 preconditions).
//! - [`digest`] — content digests for definition reconciliation.

pub mod digest;
pub mod error;
pub mod model;
pub mod store;
pub mod template;
pub mod validate;

pub use digest::ContentDigest;
pub use model::{
    Analysis, AnalysisStatus, CodeEntry, FinalResult, Repository, ScanDefinition, ScanRun,
    ScanStatus, Severity, Vulnerability, VulnerabilityBucket,
};
pub use store::{RunnerEndpoint, Store, StoreResult};

/// Initialize process-wide structured logging. `json` selects the
/// production encoder; otherwise a human-readable compact format is used.
/// Call exactly once, at process start.
pub fn init_tracing(json: bool, level: tracing::Level) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.compact().try_init();
    }
}
