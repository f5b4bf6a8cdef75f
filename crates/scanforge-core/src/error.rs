//! Error taxonomy shared across the scanforge core (spec §7).

use thiserror::Error;

/// Fatal at bootstrap: missing or malformed startup inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("malformed setting {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("no scan definitions configured")]
    EmptyScanTable,
}

/// Raised by the Runner (spec §4.1); recovered by the ScanExecutor into `status=error`.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("image pull failed for {image}: {cause}")]
    ImagePull { image: String, cause: String },

    #[error("manifest/platform mismatch for {image}: {cause}")]
    ManifestMismatch { image: String, cause: String },

    #[error("container create failed: {0}")]
    Create(String),

    #[error("container start failed: {0}")]
    Start(String),

    #[error("stream attach failed: {0}")]
    Attach(String),

    #[error("container run timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("wait for container failed: {0}")]
    Wait(String),

    #[error("reading container logs failed: {0}")]
    ReadLogs(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl RunnerError {
    /// The `kind` tag named in spec §4.1's failure model.
    pub fn kind(&self) -> &'static str {
        match self {
            RunnerError::ImagePull { .. } => "image_pull",
            RunnerError::ManifestMismatch { .. } => "image_pull",
            RunnerError::Create(_) => "create",
            RunnerError::Start(_) => "start",
            RunnerError::Attach(_) => "attach",
            RunnerError::Timeout { .. } => "timeout",
            RunnerError::Wait(_) => "wait",
            RunnerError::ReadLogs(_) => "read_logs",
            RunnerError::Transport(_) => "transport",
        }
    }

    /// True for errors §4.1 says must not be retried (manifest/platform mismatch).
    pub fn is_no_retry(&self) -> bool {
        matches!(self, RunnerError::ManifestMismatch { .. })
    }
}

/// Raised by a ParserSet entry (spec §4.5); recovered into `status=error`.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parser for '{tool}' could not interpret output: {reason}")]
    Malformed { tool: String, reason: String },

    #[error("parser for '{tool}' found no usable output")]
    Empty { tool: String },
}

/// Bubbles up from the Store contract (spec §6).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflicting write for key {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Intake rejections: bad rid/url/branch (spec §4.7, §7).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("rid '{0}' does not match [-A-Za-z0-9]+")]
    InvalidRid(String),

    #[error("repository url '{0}' is not a recognized VCS or archive URL")]
    InvalidUrl(String),

    #[error("branch '{0}' contains disallowed characters")]
    InvalidBranch(String),
}

/// Single-flight rejection (spec §4.7): `409 already_running`.
#[derive(Debug, Error)]
#[error("analysis already running for this repository/branch: rid={existing_rid}")]
pub struct ConflictError {
    pub existing_rid: String,
}

/// Top-level error for the dispatcher's two public operations.
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
