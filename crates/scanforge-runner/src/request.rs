//! Request/response shapes for the Runner contract (spec §4.1).

/// Default container-run timeout when a `ScanDefinition` does not override it.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// One one-shot container invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// `name:tag`; the last `:` is the tag delimiter (registry hosts with
    /// ports are supported) — see [`crate::image::split_image_ref`].
    pub image: String,
    pub cmd: Vec<String>,
    /// Host path bound at `/workspace` inside the container, if any.
    pub volume_path: Option<String>,
    pub timeout_seconds: u64,
    /// Bytes to stream into the container's stdin, if any.
    pub stdin: Option<Vec<u8>>,
    /// Read-write iff true; read-only otherwise (spec §4.1).
    pub read_write_volume: bool,
}

impl RunRequest {
    pub fn new(image: impl Into<String>, cmd: Vec<String>) -> Self {
        Self {
            image: image.into(),
            cmd,
            volume_path: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            stdin: None,
            read_write_volume: false,
        }
    }

    pub fn with_volume(mut self, path: impl Into<String>, read_write: bool) -> Self {
        self.volume_path = Some(path.into());
        self.read_write_volume = read_write;
        self
    }

    pub fn with_stdin(mut self, data: Vec<u8>) -> Self {
        self.stdin = Some(data);
        self.read_write_volume = true;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Captured streams and final status of one container run (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
