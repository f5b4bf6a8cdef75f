//! The `ScanExecutor` contract (spec §4.6): command synthesis, `Runner`
//! call, parser dispatch, per-tool status grading.

use std::sync::Arc;

use chrono::Utc;
use scanforge_core::error::RunnerError;
use scanforge_core::template::{self, TemplateValues};
use scanforge_core::{ScanDefinition, ScanRun, ScanStatus};
use scanforge_parsers::output::ParserOutput;
use scanforge_runner::{RunRequest, Runner};
use tracing::{info, warn};
use uuid::Uuid;

/// How much of the raw output to keep in a parse-error diagnostic (spec
/// §4.6 step 4: "diagnostic info including a truncated raw output sample").
const TRUNCATED_SAMPLE_LEN: usize = 500;

/// Per-request context a `ScanExecutor` needs beyond the `ScanDefinition`
/// itself: repository identity and, for archive-sourced analyses, the
/// extracted source tree every scan in this analysis shares.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub repository_url: String,
    pub repository_branch: String,
    /// Host path bound read-write at `/workspace` (spec §4.1), present only
    /// when the source is a staged archive — a remote-repo scan clones
    /// directly inside its own container and needs no shared mount (spec
    /// §4.2: the archive-mode copy reads from `/workspace`; a `git clone`
    /// has no such dependency).
    pub volume_path: Option<String>,
}

/// The result of driving one `ScanDefinition` to completion: the `ScanRun`
/// record the dispatcher appends to `Analysis.containers`, plus the parsed
/// output it folds into `normalized_results` / `codes` / `commit_authors`.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub run: ScanRun,
    pub output: ParserOutput,
}

fn truncate_sample(s: &str) -> String {
    if s.len() <= TRUNCATED_SAMPLE_LEN {
        s.to_string()
    } else {
        format!("{}... ({} bytes total)", &s[..TRUNCATED_SAMPLE_LEN], s.len())
    }
}

/// Grade a successfully-parsed output into the `ScanRun.status` taxonomy
/// (spec §4.6 step 5).
fn grade(output: &ParserOutput) -> ScanStatus {
    match output {
        ParserOutput::Vulnerabilities(bucket) => {
            if bucket.has_high() {
                ScanStatus::Failed
            } else if bucket.has_low_or_medium_or_info() {
                ScanStatus::Warning
            } else {
                ScanStatus::Passed
            }
        }
        // The detector isn't a vulnerability tool; a successful parse means
        // it ran to completion.
        ParserOutput::Languages(_) => ScanStatus::Passed,
        // Open Question §9.4 resolution: an empty author list is "no
        // applicable data", not a finding worth a `warning` grade.
        ParserOutput::CommitAuthors(authors) => {
            if authors.is_empty() {
                ScanStatus::NoSecTest
            } else {
                ScanStatus::Passed
            }
        }
        ParserOutput::NotApplicable => ScanStatus::NoSecTest,
    }
}

pub struct ScanExecutor {
    runner: Arc<dyn Runner>,
    /// Non-repository template values (SSH URL, substitute URL, private
    /// key) shared across every scan in a process (spec §4.3).
    base_template_values: TemplateValues,
}

impl ScanExecutor {
    pub fn new(runner: Arc<dyn Runner>, base_template_values: TemplateValues) -> Self {
        Self { runner, base_template_values }
    }

    /// Step 1: synthesize the command for `def` against `ctx` (spec §4.3).
    fn synthesize_command(&self, def: &ScanDefinition, ctx: &ScanContext) -> String {
        let values = TemplateValues {
            git_repo: Some(ctx.repository_url.clone()),
            git_branch: Some(ctx.repository_branch.clone()),
            ..self.base_template_values.clone()
        };
        template::expand(&def.cmd, &values, &ctx.repository_url)
    }

    /// Drive `def` to completion and return its `ScanRun` plus parsed
    /// output (spec §4.6, ordering is contractual per numbered step).
    pub async fn run(&self, def: &ScanDefinition, ctx: &ScanContext) -> ScanOutcome {
        // Step 1.
        let command = self.synthesize_command(def, ctx);
        // The Runner contract has no cross-backend notion of a single
        // container/pod identifier string (Daemon returns one per
        // backend call, Pod a pod name, Remote nothing) — the executor
        // mints its own scan-run identifier so every `ScanRun.cid` is
        // populated uniformly regardless of backend.
        let cid = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let mut req = RunRequest::new(def.image_ref(), vec!["sh".to_string(), "-c".to_string(), command])
            .with_timeout(def.timeout_seconds);
        if let Some(volume_path) = &ctx.volume_path {
            req = req.with_volume(volume_path.clone(), true);
        }

        // Step 2.
        let run_result = self.runner.run(&req).await;

        let finished_at = Utc::now();

        match run_result {
            Ok(result) => {
                // Step 4: dispatch to the parser keyed by `def.name`.
                match scanforge_parsers::parse(&result.stdout, &result.stderr, def) {
                    Ok(output) => {
                        // Step 5.
                        let status = grade(&output);
                        info!(tool = %def.name, cid = %cid, ?status, "scan completed");
                        ScanOutcome {
                            run: ScanRun {
                                cid,
                                scan: def.clone(),
                                started_at,
                                finished_at,
                                raw_stdout: result.stdout,
                                raw_stderr: result.stderr,
                                status,
                                info: String::new(),
                            },
                            output,
                        }
                    }
                    Err(parse_err) => {
                        let sample = if result.stdout.trim().is_empty() {
                            truncate_sample(&result.stderr)
                        } else {
                            truncate_sample(&result.stdout)
                        };
                        let info = format!("{parse_err}; raw sample: {sample}");
                        warn!(tool = %def.name, cid = %cid, %info, "scan output failed to parse");
                        ScanOutcome {
                            run: ScanRun {
                                cid,
                                scan: def.clone(),
                                started_at,
                                finished_at,
                                raw_stdout: result.stdout,
                                raw_stderr: result.stderr,
                                status: ScanStatus::Error,
                                info,
                            },
                            output: ParserOutput::NotApplicable,
                        }
                    }
                }
            }
            // Step 3: the Runner failed before or during execution.
            Err(runner_err) => {
                let info = diagnose_runner_error(&runner_err);
                warn!(tool = %def.name, cid = %cid, kind = runner_err.kind(), %info, "scan runner call failed");
                ScanOutcome {
                    run: ScanRun {
                        cid,
                        scan: def.clone(),
                        started_at,
                        finished_at,
                        raw_stdout: String::new(),
                        raw_stderr: String::new(),
                        status: ScanStatus::Error,
                        info,
                    },
                    output: ParserOutput::NotApplicable,
                }
            }
        }
    }
}

/// Step 3 diagnostic text: `"timeout"` for a timed-out container, otherwise
/// a phase-labeled description (spec §4.6 step 3).
fn diagnose_runner_error(err: &RunnerError) -> String {
    match err {
        RunnerError::Timeout { .. } => "timeout".to_string(),
        RunnerError::ImagePull { .. } | RunnerError::ManifestMismatch { .. } => {
            format!("image pull phase: {err}")
        }
        RunnerError::Create(_) => format!("create phase: {err}"),
        RunnerError::Start(_) => format!("start phase: {err}"),
        _ => err.to_string(),
    }
}
