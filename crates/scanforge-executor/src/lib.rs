//! `ScanExecutor`: drives one `ScanDefinition` to completion (spec §4.6).
//!
//! The language detector (spec §4.4) is not a distinct component here — it
//! is an ordinary `ScanDefinition` named `"language-detector"`, run through
//! the same six-step executor path, whose parser output happens to be a
//! `Languages` map instead of a `VulnerabilityBucket`.

pub mod executor;

pub use executor::{ScanContext, ScanExecutor, ScanOutcome};
