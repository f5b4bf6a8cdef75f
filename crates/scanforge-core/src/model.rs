//! Canonical data model (spec §3). Field lists are semantic, not a wire
//! format dictated by any single consumer — the HTTP layer, Store backend,
//! and dashboard exporter each serialize these shapes on their own terms.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of what is being analyzed (spec §3 `Repository`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// Remote VCS URL, or a local-archive pseudo-URL of form `file://<rid>`.
    pub url: String,
    /// May be the placeholder `"local"` when the source is an uploaded archive.
    pub branch: String,
    pub created_at: DateTime<Utc>,
    pub language_exclusions: HashSet<String>,
}

impl Repository {
    /// `(url, branch)` is the coordination key for single-flight (spec §3 invariant).
    pub fn coordination_key(&self) -> (String, String) {
        (self.url.clone(), self.branch.clone())
    }

    pub fn is_archive(&self) -> bool {
        self.url.starts_with("file://")
    }

    /// The `rid` embedded in a `file://<rid>` pseudo-URL, if this is archive-sourced.
    pub fn archive_rid(&self) -> Option<&str> {
        self.url.strip_prefix("file://")
    }
}

/// Terminal/non-terminal lifecycle states for an `Analysis` (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Running,
    Finished,
    ErrorRunning,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnalysisStatus::Running)
    }
}

/// Final pass/fail verdict for a terminal `Analysis` (spec §3, §8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinalResult {
    Passed,
    Failed,
    Warning,
    Error,
}

/// Per-tool execution outcome (spec §3 `ScanRun.status`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Passed,
    Failed,
    Warning,
    Error,
    NoSecTest,
}

/// Normalized severity (spec §3 `Vulnerability.severity`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Info,
}

/// Policy for outputs that omit a severity string (spec §3 `ScanDefinition.default_severity`).
pub type DefaultSeverity = Severity;

/// Immutable descriptor of one security tool (spec §3 `ScanDefinition`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanDefinition {
    pub name: String,
    pub image: String,
    pub image_tag: String,
    /// Templated shell command; see `scanforge_core::template`.
    pub cmd: String,
    /// Language tag, or `"Generic"`.
    pub language: String,
    pub default_severity: Severity,
    pub timeout_seconds: u64,
}

impl ScanDefinition {
    /// `image:tag` in the form the Runner contract requires (spec §4.1).
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.image_tag)
    }

    /// Whether this definition applies given a detected-language set
    /// (spec §4.7 step 3: `Generic` or a member of the detected set).
    pub fn applies_to(&self, detected: &HashSet<String>) -> bool {
        self.language == "Generic" || detected.contains(&self.language)
    }
}

/// One tool execution within an analysis (spec §3 `ScanRun`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub cid: String,
    pub scan: ScanDefinition,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub raw_stdout: String,
    pub raw_stderr: String,
    pub status: ScanStatus,
    /// Human-readable diagnosis string when `status == Error`.
    pub info: String,
}

/// The normalized finding (spec §3 `Vulnerability`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vulnerability {
    pub language: String,
    pub security_tool: String,
    pub severity: Severity,
    pub title: String,
    pub details: String,
    pub file: String,
    pub line: u32,
    pub code: String,
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub confidence: String,
    pub version: String,
    pub vulnerable_below: String,
    pub occurrences: u32,
}

impl Vulnerability {
    /// Deterministic ordering key (spec §4.5 idempotence: "list ordering
    /// must be deterministic, e.g. by (file, line, title)").
    pub fn sort_key(&self) -> (String, u32, String) {
        (self.file.clone(), self.line, self.title.clone())
    }
}

/// `{low, medium, high, no_sec}` grouping of normalized vulnerabilities (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VulnerabilityBucket {
    pub low: Vec<Vulnerability>,
    pub medium: Vec<Vulnerability>,
    pub high: Vec<Vulnerability>,
    pub no_sec: Vec<Vulnerability>,
}

impl VulnerabilityBucket {
    pub fn is_empty(&self) -> bool {
        self.low.is_empty() && self.medium.is_empty() && self.high.is_empty() && self.no_sec.is_empty()
    }

    pub fn has_high(&self) -> bool {
        !self.high.is_empty()
    }

    /// True if there's anything below `High` worth a `warning` grade.
    pub fn has_low_or_medium_or_info(&self) -> bool {
        !self.low.is_empty() || !self.medium.is_empty() || !self.no_sec.is_empty()
    }

    pub fn push(&mut self, v: Vulnerability) {
        match v.severity {
            Severity::Low => self.low.push(v),
            Severity::Medium => self.medium.push(v),
            Severity::High => self.high.push(v),
            Severity::Info => self.no_sec.push(v),
        }
    }

    /// Sort every sub-list by `(file, line, title)` so `parse(x) == parse(x)`
    /// holds regardless of tool output order (spec §8 idempotence law).
    pub fn sort_deterministic(&mut self) {
        for list in [&mut self.low, &mut self.medium, &mut self.high, &mut self.no_sec] {
            list.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }
    }

    pub fn merge(&mut self, other: VulnerabilityBucket) {
        self.low.extend(other.low);
        self.medium.extend(other.medium);
        self.high.extend(other.high);
        self.no_sec.extend(other.no_sec);
    }
}

/// One entry of the `codes` field: a detected language and its file list (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeEntry {
    pub language: String,
    pub files: Vec<String>,
}

/// One execution of the pipeline (spec §3 `Analysis`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub rid: String,
    pub repository_url: String,
    pub repository_branch: String,
    pub status: AnalysisStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub commit_authors: Vec<String>,
    pub final_result: Option<FinalResult>,
    pub containers: Vec<ScanRun>,
    /// language -> tool -> bucket
    pub normalized_results: BTreeMap<String, BTreeMap<String, VulnerabilityBucket>>,
    pub codes: Vec<CodeEntry>,
    /// Empty unless `status == ErrorRunning`.
    pub error_found: String,
}

impl Analysis {
    /// Create a freshly-intaken analysis: `status=running`, empty collections (spec §4.7 step 1).
    pub fn new_running(rid: impl Into<String>, repo: &Repository, now: DateTime<Utc>) -> Self {
        Self {
            rid: rid.into(),
            repository_url: repo.url.clone(),
            repository_branch: repo.branch.clone(),
            status: AnalysisStatus::Running,
            started_at: now,
            finished_at: None,
            commit_authors: Vec::new(),
            final_result: None,
            containers: Vec::new(),
            normalized_results: BTreeMap::new(),
            codes: Vec::new(),
            error_found: String::new(),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.containers.iter().filter(|c| c.status == ScanStatus::Passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.containers.iter().filter(|c| c.status == ScanStatus::Failed).count()
    }

    pub fn high_count(&self) -> usize {
        self.normalized_results
            .values()
            .flat_map(|by_tool| by_tool.values())
            .map(|bucket| bucket.high.len())
            .sum()
    }

    /// Merge one scan's bucket into `normalized_results[language][tool]` (spec §4.7 step 4).
    pub fn record_bucket(&mut self, language: &str, tool: &str, bucket: VulnerabilityBucket) {
        self.normalized_results
            .entry(language.to_string())
            .or_default()
            .entry(tool.to_string())
            .or_insert_with(VulnerabilityBucket::default)
            .merge(bucket);
    }
}
