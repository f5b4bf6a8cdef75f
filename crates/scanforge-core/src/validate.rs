//! Intake validation (spec §4.7 preconditions, §8 boundary behaviours).

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;

fn rid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-A-Za-z0-9]+$").expect("valid regex"))
}

fn branch_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_/.\-+\u{C0}-\u{FF}]*$").expect("valid regex"))
}

/// `rid` must match `[-A-Za-z0-9]+` (spec §4.7).
pub fn validate_rid(rid: &str) -> Result<(), ValidationError> {
    if rid_pattern().is_match(rid) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRid(rid.to_string()))
    }
}

/// `repo.url` must be a VCS URL ending `.git`, or `file://<rid>` (spec §4.7).
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if let Some(rid) = url.strip_prefix("file://") {
        return validate_rid(rid).map_err(|_| ValidationError::InvalidUrl(url.to_string()));
    }
    if (url.starts_with("https://") || url.starts_with("http://") || url.starts_with("git@"))
        && url.ends_with(".git")
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(url.to_string()))
    }
}

/// `repo.branch` must match `[A-Za-z0-9_/.\-+\u{C0}-\u{FF}]*` (spec §4.7).
pub fn validate_branch(branch: &str) -> Result<(), ValidationError> {
    if branch_pattern().is_match(branch) {
        Ok(())
    } else {
        Err(ValidationError::InvalidBranch(branch.to_string()))
    }
}
