//! The process-wide configuration record (spec §9 REDESIGN FLAGS:
//! "treat as a configuration record assembled at startup from environment
//! inputs and constructor-injected into every component; no module-level
//! globals are required").

use std::path::PathBuf;

use clap::Parser;
use scanforge_core::ScanDefinition;
use scanforge_core::template::TemplateValues;

use crate::definitions::builtin_scan_definitions;
use crate::endpoints::{normalize, DaemonSocket, EndpointSource};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no runner endpoints configured")]
    NoRunnerEndpoints,

    #[error("malformed runner endpoint '{0}': expected host:port or an absolute path")]
    MalformedEndpoint(String),
}

/// Process-wide settings, read once at startup from environment variables
/// (spec §5 "process-wide state S").
#[derive(Parser, Debug, Clone)]
#[command(name = "scanforge", about = "CI security-analysis orchestrator core")]
pub struct CliArgs {
    /// Comma-separated runner endpoints: `host:port` (TCP/TLS) or an
    /// absolute path (local IPC socket).
    #[arg(long, env = "SCANFORGE_RUNNER_ENDPOINTS", value_delimiter = ',')]
    pub runner_endpoints: Vec<String>,

    /// Root directory for staged archive uploads. Defaults to
    /// `<tmp>/<product>-zips` (spec §6).
    #[arg(long, env = "SCANFORGE_STAGING_ROOT")]
    pub staging_root: Option<PathBuf>,

    #[arg(long, env = "SCANFORGE_GIT_SSH_URL")]
    pub git_ssh_url: Option<String>,

    #[arg(long, env = "SCANFORGE_GIT_URL_TO_SUBSTITUTE")]
    pub git_url_to_substitute: Option<String>,

    #[arg(long, env = "SCANFORGE_GIT_PRIVATE_SSH_KEY_PATH")]
    pub git_private_ssh_key_path: Option<PathBuf>,

    /// Path to the TLS client certificate bundle used when dialing a TCP
    /// Daemon endpoint.
    #[arg(long, env = "SCANFORGE_TLS_CERT_PATH")]
    pub tls_cert_path: Option<PathBuf>,

    /// Emit JSON-formatted log lines instead of the human-readable format.
    #[arg(long, env = "SCANFORGE_LOG_JSON")]
    pub log_json: bool,
}

/// The fully-assembled process-wide configuration.
#[derive(Debug, Clone)]
pub struct ScanforgeConfig {
    pub runner_endpoints: Vec<DaemonSocket>,
    pub staging_root: PathBuf,
    pub tls_cert_path: Option<PathBuf>,
    pub template_values: TemplateValues,
    pub scan_definitions: Vec<ScanDefinition>,
    pub log_json: bool,
}

fn parse_endpoint(raw: &str) -> Result<EndpointSource, ConfigError> {
    let raw = raw.trim();
    if raw.starts_with('/') {
        return Ok(EndpointSource::LocalIpc { path: raw.to_string() });
    }
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| ConfigError::MalformedEndpoint(raw.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::MalformedEndpoint(raw.to_string()))?;
    Ok(EndpointSource::Tcp { host: host.to_string(), port })
}

fn default_staging_root() -> PathBuf {
    std::env::temp_dir().join("scanforge-zips")
}

impl ScanforgeConfig {
    /// Assemble the process-wide configuration from parsed CLI/env args.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.runner_endpoints.is_empty() {
            return Err(ConfigError::NoRunnerEndpoints);
        }
        let mut endpoints = Vec::with_capacity(args.runner_endpoints.len());
        for raw in &args.runner_endpoints {
            endpoints.push(normalize(&parse_endpoint(raw)?));
        }

        let git_private_ssh_key = args
            .git_private_ssh_key_path
            .as_ref()
            .and_then(|p| std::fs::read_to_string(p).ok());

        Ok(Self {
            runner_endpoints: endpoints,
            staging_root: args.staging_root.unwrap_or_else(default_staging_root),
            tls_cert_path: args.tls_cert_path,
            template_values: TemplateValues {
                git_repo: None,
                git_branch: None,
                git_ssh_url: args.git_ssh_url,
                git_url_to_substitute: args.git_url_to_substitute,
                git_private_ssh_key,
            },
            scan_definitions: builtin_scan_definitions(),
            log_json: args.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            runner_endpoints: vec!["daemon.internal:2376".to_string()],
            staging_root: None,
            git_ssh_url: None,
            git_url_to_substitute: None,
            git_private_ssh_key_path: None,
            tls_cert_path: None,
            log_json: false,
        }
    }

    #[test]
    fn rejects_empty_runner_endpoint_list() {
        let args = CliArgs { runner_endpoints: vec![], ..base_args() };
        assert!(matches!(ScanforgeConfig::from_args(args), Err(ConfigError::NoRunnerEndpoints)));
    }

    #[test]
    fn parses_tcp_endpoint() {
        let config = ScanforgeConfig::from_args(base_args()).expect("config");
        assert_eq!(config.runner_endpoints[0].address, "tcp://daemon.internal:2376");
    }

    #[test]
    fn parses_local_ipc_endpoint() {
        let args = CliArgs {
            runner_endpoints: vec!["/var/run/docker.sock".to_string()],
            ..base_args()
        };
        let config = ScanforgeConfig::from_args(args).expect("config");
        assert_eq!(config.runner_endpoints[0].address, "unix:///var/run/docker.sock");
        assert!(!config.runner_endpoints[0].use_tls);
    }

    #[test]
    fn defaults_staging_root_under_tmp() {
        let config = ScanforgeConfig::from_args(base_args()).expect("config");
        assert!(config.staging_root.ends_with("scanforge-zips"));
    }

    #[test]
    fn scan_definitions_are_populated_from_builtin_table() {
        let config = ScanforgeConfig::from_args(base_args()).expect("config");
        assert!(!config.scan_definitions.is_empty());
    }
}
