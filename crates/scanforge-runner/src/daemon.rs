//! `Daemon` backend: speaks to a container daemon over TLS-on-TCP or a local
//! IPC socket (spec §4.1).

use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::service::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use scanforge_core::error::RunnerError;
use tracing::{debug, info};

use crate::image::split_image_ref;
use crate::request::{RunRequest, RunResult};
use crate::retry::with_pull_retry;
use crate::Runner;

/// Container bind-mount target for a `ScanDefinition`'s staged source tree
/// (spec §4.1: "the backend binds it at `/workspace`").
const WORKSPACE_MOUNT: &str = "/workspace";

pub struct DaemonRunner {
    client: Docker,
}

impl DaemonRunner {
    /// Connect over TCP/TLS to `address` (`tcp://host:port`).
    pub fn connect_tcp(address: &str, tls_cert_path: Option<&str>) -> Result<Self, RunnerError> {
        let client = match tls_cert_path {
            Some(path) => Docker::connect_with_ssl(
                address,
                &format!("{path}/key.pem"),
                &format!("{path}/cert.pem"),
                &format!("{path}/ca.pem"),
                120,
                bollard::API_DEFAULT_VERSION,
            ),
            None => Docker::connect_with_http(address, 120, bollard::API_DEFAULT_VERSION),
        }
        .map_err(|e| RunnerError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Connect over the local IPC socket at `path` (`unix:///var/run/...`).
    pub fn connect_local(path: &str) -> Result<Self, RunnerError> {
        let client = Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    async fn pull_once(&self, image: &str) -> Result<(), RunnerError> {
        let (name, tag) = split_image_ref(image);
        let options = CreateImageOptions {
            from_image: name.clone(),
            tag: tag.clone(),
            ..Default::default()
        };
        let mut stream = self.client.create_image(Some(options), None, None);
        while let Some(event) = stream.next().await {
            match event {
                Ok(info) => {
                    if let Some(error) = info.error {
                        if error.to_lowercase().contains("manifest")
                            || error.to_lowercase().contains("platform")
                        {
                            return Err(RunnerError::ManifestMismatch {
                                image: image.to_string(),
                                cause: error,
                            });
                        }
                        return Err(RunnerError::ImagePull { image: image.to_string(), cause: error });
                    }
                }
                Err(e) => {
                    let msg = e.to_string();
                    if msg.to_lowercase().contains("manifest") || msg.to_lowercase().contains("platform") {
                        return Err(RunnerError::ManifestMismatch { image: image.to_string(), cause: msg });
                    }
                    return Err(RunnerError::ImagePull { image: image.to_string(), cause: msg });
                }
            }
        }
        Ok(())
    }

    async fn create_and_run(&self, req: &RunRequest) -> Result<RunResult, RunnerError> {
        let binds = req.volume_path.as_ref().map(|path| {
            let mode = if req.read_write_volume { "rw" } else { "ro" };
            vec![format!("{path}:{WORKSPACE_MOUNT}:{mode}")]
        });

        let config = Config {
            image: Some(req.image.clone()),
            cmd: Some(req.cmd.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            attach_stdin: Some(req.stdin.is_some()),
            open_stdin: Some(req.stdin.is_some()),
            stdin_once: Some(req.stdin.is_some()),
            host_config: Some(HostConfig {
                binds,
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let container = self
            .client
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| RunnerError::Create(e.to_string()))?;
        let cid = container.id;

        let result = self.start_and_await(&cid, req).await;

        let _ = self
            .client
            .remove_container(
                &cid,
                Some(RemoveContainerOptions { force: true, v: true, ..Default::default() }),
            )
            .await;

        result
    }

    async fn start_and_await(&self, cid: &str, req: &RunRequest) -> Result<RunResult, RunnerError> {
        if let Some(stdin) = &req.stdin {
            self.stream_stdin(cid, stdin).await?;
        }

        self.client
            .start_container::<String>(cid, None)
            .await
            .map_err(|e| RunnerError::Start(e.to_string()))?;

        let wait_future = self
            .client
            .wait_container(cid, None::<WaitContainerOptions<String>>)
            .collect::<Vec<_>>();

        let waited = tokio::time::timeout(Duration::from_secs(req.timeout_seconds), wait_future)
            .await
            .map_err(|_| RunnerError::Timeout { timeout_secs: req.timeout_seconds })?;

        let exit_code = waited
            .into_iter()
            .next()
            .transpose()
            .map_err(|e| RunnerError::Wait(e.to_string()))?
            .map(|w| w.status_code)
            .unwrap_or(0);

        let (stdout, stderr) = self.collect_logs(cid).await?;

        Ok(RunResult { stdout, stderr, exit_code })
    }

    async fn stream_stdin(&self, cid: &str, data: &[u8]) -> Result<(), RunnerError> {
        // Single-shot attach: write the archive/bytes then close the
        // write end so the container sees EOF (spec §4.1, §9 REDESIGN
        // FLAGS "Streaming stdin into a container").
        let attach_options = bollard::container::AttachContainerOptions::<String> {
            stdin: Some(true),
            stdout: Some(false),
            stderr: Some(false),
            stream: Some(true),
            ..Default::default()
        };
        let bollard::container::AttachContainerResults { mut input, .. } = self
            .client
            .attach_container(cid, Some(attach_options))
            .await
            .map_err(|e| RunnerError::Attach(e.to_string()))?;

        use tokio::io::AsyncWriteExt;
        input
            .write_all(data)
            .await
            .map_err(|e| RunnerError::Attach(e.to_string()))?;
        input.shutdown().await.map_err(|e| RunnerError::Attach(e.to_string()))?;
        Ok(())
    }

    async fn collect_logs(&self, cid: &str) -> Result<(String, String), RunnerError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = self.client.logs(cid, Some(options));
        let mut stdout = String::new();
        let mut stderr = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(|e| RunnerError::ReadLogs(e.to_string()))? {
                LogOutput::StdOut { message } => stdout.push_str(&String::from_utf8_lossy(&message)),
                LogOutput::StdErr { message } => stderr.push_str(&String::from_utf8_lossy(&message)),
                LogOutput::Console { message } => stdout.push_str(&String::from_utf8_lossy(&message)),
                LogOutput::StdIn { .. } => {}
            }
        }
        Ok((stdout, stderr))
    }
}

#[async_trait]
impl Runner for DaemonRunner {
    async fn run(&self, req: &RunRequest) -> Result<RunResult, RunnerError> {
        self.ensure_image(&req.image).await?;
        debug!(image = %req.image, "running one-shot container");
        self.create_and_run(req).await
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RunnerError> {
        let (name, tag) = split_image_ref(image);
        if self.client.inspect_image(&format!("{name}:{tag}")).await.is_ok() {
            return Ok(());
        }
        with_pull_retry(image, || self.pull_once(image)).await
    }

    async fn health(&self) -> Result<(), RunnerError> {
        self.client
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RunnerError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_mount_path_matches_contract() {
        assert_eq!(WORKSPACE_MOUNT, "/workspace");
    }
}
