//! Pre-flight path-traversal validation for staged archives (spec §4.2, §8
//! "Archive-entry traversal: any archive containing a path that, after
//! cleaning, is not a strict descendant of the destination MUST be rejected
//! by the extractor"). The extraction itself runs inside the Runner's
//! container (see [`crate::protocol`]); this module rejects a hostile
//! archive before it is ever handed to that container.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::StagerError;

/// Join `dest` with an archive entry's own (attacker-controlled) path,
/// rejecting anything that would land outside `dest` once `.`/`..`
/// components are resolved. Mirrors the guard the extraction container is
/// required to apply (spec §4.2).
fn safe_join(dest: &Path, entry_name: &str) -> Result<PathBuf, StagerError> {
    let mut cleaned = PathBuf::new();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    return Err(StagerError::PathTraversal { entry: entry_name.to_string() });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StagerError::PathTraversal { entry: entry_name.to_string() });
            }
        }
    }
    if cleaned.as_os_str().is_empty() {
        return Err(StagerError::PathTraversal { entry: entry_name.to_string() });
    }
    Ok(dest.join(cleaned))
}

/// Enumerate every entry of `archive_path` and run it through [`safe_join`]
/// against `dest` without writing anything — a cheap defense-in-depth check
/// performed before the archive's bytes are streamed into the extraction
/// container, so a hostile archive never reaches `unzip` at all.
pub fn validate_archive_entries(archive_path: &Path, dest: &Path, rid: &str) -> Result<(), StagerError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| StagerError::MalformedArchive {
        rid: rid.to_string(),
        reason: e.to_string(),
    })?;

    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| StagerError::MalformedArchive {
            rid: rid.to_string(),
            reason: e.to_string(),
        })?;
        safe_join(dest, entry.name())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(entries: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        {
            let mut writer = zip::ZipWriter::new(file.reopen().expect("reopen"));
            for (name, data) in entries {
                writer.start_file(*name, SimpleFileOptions::default()).expect("start_file");
                writer.write_all(data).expect("write");
            }
            writer.finish().expect("finish");
        }
        file
    }

    #[test]
    fn safe_join_resolves_normal_relative_paths() {
        let dest = PathBuf::from("/tmp/scanforge-zz1");
        let joined = safe_join(&dest, "src/main.rs").expect("ok");
        assert_eq!(joined, dest.join("src/main.rs"));
    }

    #[test]
    fn safe_join_rejects_parent_dir_escape() {
        let dest = PathBuf::from("/tmp/scanforge-zz1");
        assert!(safe_join(&dest, "../../etc/passwd").is_err());
    }

    #[test]
    fn safe_join_rejects_absolute_entry() {
        let dest = PathBuf::from("/tmp/scanforge-zz1");
        assert!(safe_join(&dest, "/etc/passwd").is_err());
    }

    #[test]
    fn safe_join_allows_internal_dotdot_that_stays_inside() {
        let dest = PathBuf::from("/tmp/scanforge-zz1");
        let joined = safe_join(&dest, "a/b/../c.txt").expect("ok");
        assert_eq!(joined, dest.join("a/c.txt"));
    }

    #[test]
    fn accepts_well_formed_archive() {
        let zip = write_zip(&[("a.txt", b"hello"), ("dir/b.txt", b"world")]);
        let dest = tempfile::tempdir().expect("tempdir");

        validate_archive_entries(zip.path(), dest.path(), "zz1").expect("validate");
    }

    #[test]
    fn rejects_archive_with_traversal_entry() {
        let zip = write_zip(&[("../escape.txt", b"pwned")]);
        let dest = tempfile::tempdir().expect("tempdir");

        let result = validate_archive_entries(zip.path(), dest.path(), "zz1");
        assert!(matches!(result, Err(StagerError::PathTraversal { .. })));
    }

    #[test]
    fn rejects_malformed_archive_bytes() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        fs::write(file.path(), b"not a zip").unwrap();
        let dest = tempfile::tempdir().expect("tempdir");

        let result = validate_archive_entries(file.path(), dest.path(), "zz1");
        assert!(matches!(result, Err(StagerError::MalformedArchive { .. })));
    }
}
