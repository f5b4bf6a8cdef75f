//! The shapes a parser can hand back to the executor (spec §4.5).

use std::collections::BTreeMap;

use scanforge_core::VulnerabilityBucket;

/// Most tools normalize to a bucket of vulnerabilities; the language
/// detector and commit-author collector produce other shapes instead of
/// findings, and some tools report "not applicable" without that being a
/// parse failure (e.g. a dependency scanner finding no manifest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserOutput {
    Vulnerabilities(VulnerabilityBucket),
    /// language -> file list (spec §3 `codes`).
    Languages(BTreeMap<String, Vec<String>>),
    CommitAuthors(Vec<String>),
    /// Nothing to normalize; the caller should record `status=no_sec_test`.
    NotApplicable,
}
