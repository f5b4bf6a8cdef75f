//! Uniform one-shot container execution contract (spec §4.1).
//!
//! [`Runner`] is the capability set `{Run, EnsureImage, Health}` shared by
//! three backends: [`daemon::DaemonRunner`] (a container daemon over TLS-on-TCP
//! or local IPC), [`pod::PodRunner`] (a cluster pod runtime), and
//! [`remote::RemoteRunner`] (the same contract spoken over HTTP). Tests
//! substitute a fake implementation of the trait (spec §9 REDESIGN FLAGS).

pub mod daemon;
pub mod image;
pub mod pod;
pub mod remote;
pub mod request;
mod retry;

use async_trait::async_trait;
use scanforge_core::error::RunnerError;

pub use request::{RunRequest, RunResult, DEFAULT_TIMEOUT_SECONDS};

/// The capability set every backend implements (spec §4.1, §9).
#[async_trait]
pub trait Runner: Send + Sync {
    /// Execute exactly one container per call and return its captured
    /// streams and final exit status (spec §4.1).
    async fn run(&self, req: &RunRequest) -> Result<RunResult, RunnerError>;

    /// Pull `image` if it is not already present locally/in-cluster.
    async fn ensure_image(&self, image: &str) -> Result<(), RunnerError>;

    /// Probe backend liveness.
    async fn health(&self) -> Result<(), RunnerError>;
}
