//! `Remote` backend: speaks the Runner contract over HTTP — JSON body for
//! non-stdin runs, multipart for stdin runs (spec §4.1).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use scanforge_core::error::RunnerError;
use serde::{Deserialize, Serialize};

use crate::request::{RunRequest, RunResult};
use crate::Runner;

#[derive(Debug, Serialize)]
struct RunRequestBody<'a> {
    image: &'a str,
    cmd: &'a [String],
    volume_path: Option<&'a str>,
    timeout_seconds: u64,
    read_write_volume: bool,
}

#[derive(Debug, Deserialize)]
struct RunResponseBody {
    stdout: String,
    stderr: String,
    exit_code: i64,
    err: Option<String>,
}

pub struct RemoteRunner {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteRunner {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15 * 60))
            .build()
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn run_json(&self, req: &RunRequest) -> Result<RunResponseBody, RunnerError> {
        let body = RunRequestBody {
            image: &req.image,
            cmd: &req.cmd,
            volume_path: req.volume_path.as_deref(),
            timeout_seconds: req.timeout_seconds,
            read_write_volume: req.read_write_volume,
        };

        let response = self
            .client
            .post(self.endpoint("run"))
            .timeout(Duration::from_secs(req.timeout_seconds + 30))
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;

        response.json().await.map_err(|e| RunnerError::Transport(e.to_string()))
    }

    async fn run_multipart(&self, req: &RunRequest, stdin: &[u8]) -> Result<RunResponseBody, RunnerError> {
        let metadata = serde_json::json!({
            "image": req.image,
            "cmd": req.cmd,
            "volume_path": req.volume_path,
            "timeout_seconds": req.timeout_seconds,
            "read_write_volume": req.read_write_volume,
        });

        let form = Form::new()
            .text("metadata", metadata.to_string())
            .part("stdin", Part::bytes(stdin.to_vec()).file_name("stdin.bin"));

        let response = self
            .client
            .post(self.endpoint("run"))
            .timeout(Duration::from_secs(req.timeout_seconds + 30))
            .multipart(form)
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;

        response.json().await.map_err(|e| RunnerError::Transport(e.to_string()))
    }
}

#[async_trait]
impl Runner for RemoteRunner {
    async fn run(&self, req: &RunRequest) -> Result<RunResult, RunnerError> {
        let body = match &req.stdin {
            Some(stdin) => self.run_multipart(req, stdin).await?,
            None => self.run_json(req).await?,
        };

        if let Some(err) = body.err {
            return Err(RunnerError::Transport(err));
        }

        Ok(RunResult { stdout: body.stdout, stderr: body.stderr, exit_code: body.exit_code })
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RunnerError> {
        self.client
            .post(self.endpoint("images/ensure"))
            .json(&serde_json::json!({ "image": image }))
            .send()
            .await
            .map_err(|e| RunnerError::ImagePull { image: image.to_string(), cause: e.to_string() })?
            .error_for_status()
            .map_err(|e| RunnerError::ImagePull { image: image.to_string(), cause: e.to_string() })?;
        Ok(())
    }

    async fn health(&self) -> Result<(), RunnerError> {
        self.client
            .get(self.endpoint("healthz"))
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| RunnerError::Transport(e.to_string()))?;
        Ok(())
    }
}
