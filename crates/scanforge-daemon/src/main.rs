//! `scanforged`: the orchestrator process. Assembles process-wide
//! configuration, the `Store`, a `Runner` backend per configured endpoint,
//! the `ArtifactStager`, and the `AnalysisDispatcher`, then idles.
//!
//! The HTTP request surface, the document-store-backed `Store`, and
//! authentication are external collaborators (spec §1 Non-goals); this
//! binary wires the core components together the way a real service's
//! bootstrap module would, stopping short of the surfaces this repo does
//! not own.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use scanforge_config::{CliArgs, ScanforgeConfig};
use scanforge_core::error::RunnerError;
use scanforge_core::store::RunnerEndpoint;
use scanforge_core::Store;
use scanforge_dispatcher::{AnalysisDispatcher, RunnerFactory};
use scanforge_runner::{daemon::DaemonRunner, Runner};
use scanforge_stager::ArtifactStager;
use scanforge_store_mem::InMemoryStore;
use tracing::{info, Level};

/// Dispatches a round-robin-selected [`RunnerEndpoint`] to a connected
/// [`DaemonRunner`], per the scheme `normalize` stamped onto its address
/// (spec §6): `tcp://` dials TLS-on-TCP, `unix://` dials the local IPC
/// socket. A `Pod` or `Remote` deployment would register its own
/// `RunnerFactory` here instead; the dispatcher only depends on the trait.
struct DaemonRunnerFactory {
    tls_cert_path: Option<String>,
}

#[async_trait]
impl RunnerFactory for DaemonRunnerFactory {
    async fn runner_for(&self, endpoint: &RunnerEndpoint) -> Result<Arc<dyn Runner>, RunnerError> {
        if let Some(path) = endpoint.address.strip_prefix("unix://") {
            let runner = DaemonRunner::connect_local(path)?;
            return Ok(Arc::new(runner));
        }
        if let Some(rest) = endpoint.address.strip_prefix("tcp://") {
            let address = format!("tcp://{rest}");
            let runner = DaemonRunner::connect_tcp(&address, self.tls_cert_path.as_deref())?;
            return Ok(Arc::new(runner));
        }
        Err(RunnerError::Transport(format!(
            "unrecognized runner endpoint scheme: {}",
            endpoint.address
        )))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ScanforgeConfig::from_args(args).context("assembling process configuration")?;

    scanforge_core::init_tracing(config.log_json, Level::INFO);
    info!(
        endpoints = config.runner_endpoints.len(),
        scans = config.scan_definitions.len(),
        staging_root = %config.staging_root.display(),
        "scanforged starting"
    );

    let runner_endpoints: Vec<RunnerEndpoint> = config
        .runner_endpoints
        .iter()
        .map(|s| RunnerEndpoint { address: s.address.clone() })
        .collect();
    let store = Arc::new(InMemoryStore::new(runner_endpoints));
    for def in &config.scan_definitions {
        store
            .upsert_scan_definition(def)
            .await
            .context("reconciling scan-definition table into the store")?;
    }

    let runner_factory: Arc<dyn RunnerFactory> = Arc::new(DaemonRunnerFactory {
        tls_cert_path: config.tls_cert_path.as_ref().map(|p| p.display().to_string()),
    });
    let stager = Arc::new(ArtifactStager::new(config.staging_root.clone()).context("initializing artifact stager")?);

    let _dispatcher = AnalysisDispatcher::new(
        store,
        runner_factory,
        stager,
        config.scan_definitions.clone(),
        config.template_values.clone(),
    );

    info!("scanforged ready; awaiting intake from the HTTP surface");
    std::future::pending::<()>().await;
    Ok(())
}
