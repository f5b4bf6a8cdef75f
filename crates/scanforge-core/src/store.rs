//! The `Store` contract the dispatcher requires (spec §6). The persistence
//! layer itself — a document store used as a key-value/index for analyses,
//! repositories, users, and scan definitions — is an external collaborator;
//! this trait is the entire seam the core touches.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::model::{Analysis, ScanDefinition};

pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// A single round-robin-selected runner endpoint (spec §5, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerEndpoint {
    /// Already normalized per spec §6 (`tcp://host:port` or `unix:///path`).
    pub address: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a brand-new analysis record unconditionally. Fails with
    /// `StorageError::Conflict` if `rid` already exists; does not enforce
    /// the single-flight `(repository_url, repository_branch)` invariant —
    /// use `insert_if_not_running` for intake.
    async fn insert_analysis(&self, analysis: &Analysis) -> StoreResult<()>;

    /// Full-record replace, keyed by `rid` (spec §5: "all writes are keyed
    /// by rid, full-record replace").
    async fn update_analysis_by_rid(&self, analysis: &Analysis) -> StoreResult<()>;

    async fn find_analysis_by_rid(&self, rid: &str) -> StoreResult<Analysis>;

    /// Atomic single-flight intake (spec §4.7, §8): insert `analysis` unless
    /// a `running` analysis already exists for its `(repository_url,
    /// repository_branch)` pair, in one conditional-write call. Returns the
    /// conflicting analysis instead of inserting when one is found, so the
    /// check and the insert can never be split into two calls a concurrent
    /// caller could race between — "true atomicity is the Store
    /// implementation's responsibility" (spec §4.7).
    async fn insert_if_not_running(&self, analysis: &Analysis) -> StoreResult<Option<Analysis>>;

    /// Round-robin host selection over the configured runner endpoints
    /// (spec §5: "runner endpoint list (round-robin index) ... atomically
    /// incremented").
    async fn find_or_advance_runner_endpoints(&self) -> StoreResult<RunnerEndpoint>;

    /// Process-wide scan-definition table reconciliation (spec §3: "loaded
    /// at startup and reconciled into the Store").
    async fn upsert_scan_definition(&self, def: &ScanDefinition) -> StoreResult<()>;

    /// Pass-through seam for the external auth collaborator; this core never
    /// interprets the result beyond presence/absence (spec §6 `Store contract`).
    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<String>>;
}
