//! An in-memory `Store` implementation (spec §6 contract). This is not the
//! document-store-backed persistence layer the real system runs against —
//! that remains an external collaborator — but a reference used for tests
//! and single-node demo wiring, the way a real implementation's conditional
//! insert would be backed by a unique partial index instead of a mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use scanforge_core::error::StorageError;
use scanforge_core::store::{RunnerEndpoint, Store, StoreResult};
use scanforge_core::{Analysis, AnalysisStatus, ScanDefinition};

struct Inner {
    analyses: HashMap<String, Analysis>,
    scan_definitions: HashMap<String, ScanDefinition>,
    users: HashMap<String, String>,
}

/// Reference `Store` implementation backed by a `std::sync::Mutex`-guarded
/// map. Single-flight here is the same conditional-write pattern a document
/// store would use (spec §9 REDESIGN FLAGS): the mutex makes the
/// check-then-insert atomic for this process; a real backend gets the same
/// property from a unique index on `(repository_url, repository_branch)`
/// scoped to `status = running`.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    runner_endpoints: Vec<RunnerEndpoint>,
    round_robin_cursor: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(runner_endpoints: Vec<RunnerEndpoint>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                analyses: HashMap::new(),
                scan_definitions: HashMap::new(),
                users: HashMap::new(),
            }),
            runner_endpoints,
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    /// Seed a known user, for tests exercising the `find_user_by_name` seam.
    pub fn seed_user(&self, name: &str, id: &str) {
        self.inner.lock().expect("lock poisoned").users.insert(name.to_string(), id.to_string());
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_analysis(&self, analysis: &Analysis) -> StoreResult<()> {
        let mut guard = self.inner.lock().expect("lock poisoned");
        if guard.analyses.contains_key(&analysis.rid) {
            return Err(StorageError::Conflict(analysis.rid.clone()));
        }
        guard.analyses.insert(analysis.rid.clone(), analysis.clone());
        Ok(())
    }

    async fn update_analysis_by_rid(&self, analysis: &Analysis) -> StoreResult<()> {
        let mut guard = self.inner.lock().expect("lock poisoned");
        if !guard.analyses.contains_key(&analysis.rid) {
            return Err(StorageError::NotFound(analysis.rid.clone()));
        }
        guard.analyses.insert(analysis.rid.clone(), analysis.clone());
        Ok(())
    }

    async fn find_analysis_by_rid(&self, rid: &str) -> StoreResult<Analysis> {
        let guard = self.inner.lock().expect("lock poisoned");
        guard.analyses.get(rid).cloned().ok_or_else(|| StorageError::NotFound(rid.to_string()))
    }

    async fn insert_if_not_running(&self, analysis: &Analysis) -> StoreResult<Option<Analysis>> {
        let mut guard = self.inner.lock().expect("lock poisoned");
        let existing = guard.analyses.values().find(|a| {
            a.status == AnalysisStatus::Running
                && a.repository_url == analysis.repository_url
                && a.repository_branch == analysis.repository_branch
        });
        if let Some(existing) = existing {
            return Ok(Some(existing.clone()));
        }
        if guard.analyses.contains_key(&analysis.rid) {
            return Err(StorageError::Conflict(analysis.rid.clone()));
        }
        guard.analyses.insert(analysis.rid.clone(), analysis.clone());
        Ok(None)
    }

    async fn find_or_advance_runner_endpoints(&self) -> StoreResult<RunnerEndpoint> {
        if self.runner_endpoints.is_empty() {
            return Err(StorageError::Backend("no runner endpoints configured".to_string()));
        }
        let idx = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed) % self.runner_endpoints.len();
        Ok(self.runner_endpoints[idx].clone())
    }

    async fn upsert_scan_definition(&self, def: &ScanDefinition) -> StoreResult<()> {
        let mut guard = self.inner.lock().expect("lock poisoned");
        guard.scan_definitions.insert(def.name.clone(), def.clone());
        Ok(())
    }

    async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<String>> {
        let guard = self.inner.lock().expect("lock poisoned");
        Ok(guard.users.get(name).cloned())
    }
}
