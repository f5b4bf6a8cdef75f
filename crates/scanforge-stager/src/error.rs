//! Errors raised by the stager (spec §4.2, §7 `StorageError`-adjacent but
//! scoped to the filesystem/archive concern, so it gets its own variant set).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagerError {
    #[error("rid '{0}' does not match [-A-Za-z0-9]+")]
    InvalidRid(String),

    #[error("an archive is already staged for rid '{0}'")]
    AlreadyStaged(String),

    #[error("no archive staged for rid '{0}'")]
    NotStaged(String),

    #[error("archive entry '{entry}' escapes the extraction destination")]
    PathTraversal { entry: String },

    #[error("malformed archive for rid '{rid}': {reason}")]
    MalformedArchive { rid: String, reason: String },

    #[error("extraction container for rid '{rid}' failed: {reason}")]
    Extraction { rid: String, reason: String },

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
