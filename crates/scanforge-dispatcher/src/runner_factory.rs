//! Resolving a `RunnerEndpoint` (spec §6, round-robin-selected) into a live
//! [`Runner`] the dispatcher can hand to a `ScanExecutor`. Which backend
//! (`Daemon`, `Pod`, `Remote`) a given endpoint address speaks is a bootstrap
//! concern external to this crate — the daemon binary supplies the concrete
//! factory; this trait is the seam tests substitute a fake against.

use std::sync::Arc;

use async_trait::async_trait;
use scanforge_core::error::RunnerError;
use scanforge_core::store::RunnerEndpoint;
use scanforge_runner::Runner;

#[async_trait]
pub trait RunnerFactory: Send + Sync {
    async fn runner_for(&self, endpoint: &RunnerEndpoint) -> Result<Arc<dyn Runner>, RunnerError>;
}

/// A factory that always hands back the same pre-built [`Runner`],
/// ignoring the endpoint it was asked to resolve. Useful for single-node
/// demo wiring and for tests that don't exercise endpoint selection.
pub struct StaticRunnerFactory {
    runner: Arc<dyn Runner>,
}

impl StaticRunnerFactory {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl RunnerFactory for StaticRunnerFactory {
    async fn runner_for(&self, _endpoint: &RunnerEndpoint) -> Result<Arc<dyn Runner>, RunnerError> {
        Ok(self.runner.clone())
    }
}
