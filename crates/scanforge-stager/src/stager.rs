//! `ArtifactStager`: accepts an uploaded archive for a request id, persists
//! it on a path shared with the runner's execution environment, and
//! releases storage when the analysis terminates (spec §4.2).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanforge_core::validate::validate_rid;
use scanforge_runner::{RunRequest, Runner};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::StagerError;
use crate::extract::validate_archive_entries;
use crate::protocol::stream_strategy_command;

/// Pre-built image the extraction container runs (spec §4.2: "a pre-built
/// image that contains an unzip utility").
const UNZIP_IMAGE: &str = "scanforge/unzip:stable";

/// `<staging_root>/<rid>.zip` / `<staging_root>/<rid>/` layout (spec §6).
pub struct ArtifactStager {
    root: PathBuf,
}

impl ArtifactStager {
    /// `root` defaults to `<tmp>/<product>-zips` (spec §6); created here
    /// with permission `0755` if missing (spec §4.2).
    pub fn new(root: PathBuf) -> Result<Self, StagerError> {
        std::fs::create_dir_all(&root)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(Self { root })
    }

    fn archive_path(&self, rid: &str) -> PathBuf {
        self.root.join(format!("{rid}.zip"))
    }

    fn extracted_dir(&self, rid: &str) -> PathBuf {
        self.root.join(rid)
    }

    /// Write `data` to `<root>/<rid>.zip`, atomically (write-then-rename).
    /// Rejects a second upload for the same `rid` (spec §5: "single-writer
    /// discipline per rid").
    pub async fn stage(&self, rid: &str, data: &[u8]) -> Result<PathBuf, StagerError> {
        validate_rid(rid).map_err(|_| StagerError::InvalidRid(rid.to_string()))?;

        let dest = self.archive_path(rid);
        if tokio::fs::metadata(&dest).await.is_ok() {
            return Err(StagerError::AlreadyStaged(rid.to_string()));
        }

        let tmp_path = self.root.join(format!(".{rid}.zip.tmp"));
        {
            let mut tmp = tokio::fs::File::create(&tmp_path).await?;
            tmp.write_all(data).await?;
            tmp.flush().await?;
        }
        tokio::fs::rename(&tmp_path, &dest).await?;

        info!(rid, bytes = data.len(), "staged archive");
        Ok(dest)
    }

    /// Extract the staged archive for `rid`, returning the extracted tree
    /// root (`<root>/<rid>/`). Delegates the extraction itself to `runner`
    /// via the stream strategy (spec §4.2): the archive bytes are streamed
    /// into a container's stdin and unpacked there, with `<root>` bound
    /// read-write at `/workspace` so the result lands at `<root>/<rid>/` on
    /// the host. Every entry name is validated against path traversal
    /// locally first, so a hostile archive is rejected before it is ever
    /// handed to the container (spec §8 boundary behaviour).
    pub async fn prepare_extract(&self, rid: &str, runner: &Arc<dyn Runner>) -> Result<PathBuf, StagerError> {
        validate_rid(rid).map_err(|_| StagerError::InvalidRid(rid.to_string()))?;

        let archive = self.archive_path(rid);
        if tokio::fs::metadata(&archive).await.is_err() {
            return Err(StagerError::NotStaged(rid.to_string()));
        }

        let dest = self.extracted_dir(rid);
        let rid_owned = rid.to_string();
        let archive_clone = archive.clone();
        let dest_clone = dest.clone();
        tokio::task::spawn_blocking(move || validate_archive_entries(&archive_clone, &dest_clone, &rid_owned))
            .await
            .map_err(|e| StagerError::Io(std::io::Error::other(e.to_string())))??;

        let bytes = tokio::fs::read(&archive).await?;
        let req = RunRequest::new(UNZIP_IMAGE, vec!["sh".to_string(), "-c".to_string(), stream_strategy_command(rid)])
            .with_volume(self.root.to_string_lossy().into_owned(), true)
            .with_stdin(bytes);

        let result = runner.run(&req).await.map_err(|e| StagerError::Extraction { rid: rid.to_string(), reason: e.to_string() })?;
        if !result.success() {
            return Err(StagerError::Extraction {
                rid: rid.to_string(),
                reason: format!("exit_code={}, stderr={}", result.exit_code, result.stderr),
            });
        }

        debug!(rid, dest = %dest.display(), "extracted staged archive via runner");
        Ok(dest)
    }

    /// Remove the archive and the extracted directory, ignoring not-found
    /// (spec §4.2, idempotence law: `Cleanup(rid); Cleanup(rid)` is a no-op
    /// after the first).
    pub async fn cleanup(&self, rid: &str) -> Result<(), StagerError> {
        let archive = self.archive_path(rid);
        let dir = self.extracted_dir(rid);

        let _ = tokio::fs::remove_file(&archive).await;
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
