//! `AnalysisDispatcher`: per-request state machine with parallel fan-out
//! (spec §4.7).
//!
//! ```text
//!   intake ──► running ──► (aggregate) ──► finished
//!                  │
//!                  └──► error running  (terminal)
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use scanforge_core::error::{ConflictError, DispatcherError};
use scanforge_core::template::TemplateValues;
use scanforge_core::validate::{validate_branch, validate_rid, validate_url};
use scanforge_core::{Analysis, AnalysisStatus, CodeEntry, FinalResult, Repository, ScanDefinition, ScanStatus, Store};
use scanforge_executor::{ScanContext, ScanExecutor};
use scanforge_parsers::output::ParserOutput;
use scanforge_stager::ArtifactStager;
use tracing::{error, info, warn};

use crate::runner_factory::RunnerFactory;

/// Bounded retry for the terminal write (Open Question §9.3 resolution:
/// persistent retry with backoff rather than leaving the record `running`
/// forever).
const MAX_TERMINAL_WRITE_ATTEMPTS: u32 = 5;
const TERMINAL_WRITE_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct AnalysisDispatcher {
    store: Arc<dyn Store>,
    runner_factory: Arc<dyn RunnerFactory>,
    stager: Arc<ArtifactStager>,
    scan_definitions: Arc<Vec<ScanDefinition>>,
    template_values: TemplateValues,
}

impl AnalysisDispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        runner_factory: Arc<dyn RunnerFactory>,
        stager: Arc<ArtifactStager>,
        scan_definitions: Vec<ScanDefinition>,
        template_values: TemplateValues,
    ) -> Self {
        Self {
            store,
            runner_factory,
            stager,
            scan_definitions: Arc::new(scan_definitions),
            template_values,
        }
    }

    /// Idempotent intake (spec §4.7). Validates the request, enforces
    /// single-flight on `(url, branch)`, persists the `running` record, and
    /// spawns the background task that drives it to a terminal state. The
    /// caller (the external HTTP layer) gets `201 created` as soon as this
    /// returns `Ok`; everything after that is observed via the retrieval
    /// path against the `Store`, never returned here.
    pub async fn start(&self, rid: &str, repo: Repository) -> Result<(), DispatcherError> {
        validate_rid(rid)?;
        validate_url(&repo.url)?;
        validate_branch(&repo.branch)?;

        let analysis = Analysis::new_running(rid, &repo, Utc::now());
        if let Some(existing) = self.store.insert_if_not_running(&analysis).await? {
            return Err(ConflictError { existing_rid: existing.rid }.into());
        }
        info!(rid, url = %repo.url, branch = %repo.branch, "analysis intake accepted");

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run_to_completion(analysis, repo).await;
        });

        Ok(())
    }

    /// Steps 2-5 of the state machine: detect, fan-out, aggregate, finish.
    /// Any failure along the way is folded into a terminal `error running`
    /// write rather than propagated — the caller of `start` has already
    /// returned (spec §7: "scan-level errors are absorbed into the analysis
    /// record").
    async fn run_to_completion(&self, mut analysis: Analysis, repo: Repository) {
        let runner = match self.resolve_runner().await {
            Ok(r) => r,
            Err(e) => {
                self.terminate_error(&mut analysis, &format!("resolving runner endpoint: {e}")).await;
                return;
            }
        };

        let volume_path = if repo.is_archive() {
            let rid = repo.archive_rid().unwrap_or(&analysis.rid);
            match self.stager.prepare_extract(rid, &runner).await {
                Ok(dir) => Some(dir.to_string_lossy().into_owned()),
                Err(e) => {
                    self.terminate_error(&mut analysis, &format!("extracting staged archive: {e}")).await;
                    return;
                }
            }
        } else {
            None
        };

        let executor = ScanExecutor::new(runner, self.template_values.clone());
        let ctx = ScanContext {
            repository_url: repo.url.clone(),
            repository_branch: repo.branch.clone(),
            volume_path,
        };

        let detector_def = match self.scan_definitions.iter().find(|d| d.name == "language-detector") {
            Some(d) => d.clone(),
            None => {
                self.terminate_error(&mut analysis, "no language-detector scan definition configured").await;
                return;
            }
        };

        // Step 2: language detection strictly precedes fan-out (spec §5
        // ordering guarantee).
        let detect_outcome = executor.run(&detector_def, &ctx).await;
        analysis.containers.push(detect_outcome.run.clone());
        if detect_outcome.run.status == ScanStatus::Error {
            self.terminate_error(
                &mut analysis,
                &format!("language detection failed: {}", detect_outcome.run.info),
            )
            .await;
            return;
        }

        let mut detected: BTreeMap<String, Vec<String>> = match detect_outcome.output {
            ParserOutput::Languages(map) => map,
            _ => BTreeMap::new(),
        };
        for excluded in &repo.language_exclusions {
            detected.remove(excluded);
        }
        analysis.codes = detected
            .iter()
            .map(|(language, files)| CodeEntry { language: language.clone(), files: files.clone() })
            .collect();
        let detected_set: HashSet<String> = detected.keys().cloned().collect();

        // Step 3: fan-out one ScanExecutor per applicable ScanDefinition,
        // concurrently (spec §4.7, §5).
        let applicable: Vec<ScanDefinition> = self
            .scan_definitions
            .iter()
            .filter(|d| d.name != "language-detector" && d.applies_to(&detected_set))
            .cloned()
            .collect();

        let scan_futures = applicable.iter().map(|def| {
            let executor = &executor;
            let ctx = ctx.clone();
            async move { (def.clone(), executor.run(def, &ctx).await) }
        });
        let results = join_all(scan_futures).await;

        // Step 4: aggregate.
        let mut any_error = false;
        let mut any_high = false;
        let mut any_low_medium_info = false;

        for (def, outcome) in results {
            analysis.containers.push(outcome.run.clone());
            if outcome.run.status == ScanStatus::Error {
                any_error = true;
            }
            match outcome.output {
                ParserOutput::Vulnerabilities(bucket) => {
                    any_high = any_high || bucket.has_high();
                    any_low_medium_info = any_low_medium_info || bucket.has_low_or_medium_or_info();
                    analysis.record_bucket(&def.language, &def.name, bucket);
                }
                ParserOutput::CommitAuthors(authors) => {
                    analysis.commit_authors = authors;
                }
                ParserOutput::Languages(_) | ParserOutput::NotApplicable => {}
            }
        }

        let final_result = if any_error && !any_high {
            FinalResult::Error
        } else if any_high {
            FinalResult::Failed
        } else if any_low_medium_info {
            FinalResult::Warning
        } else {
            FinalResult::Passed
        };

        // Step 5: finish.
        analysis.status = AnalysisStatus::Finished;
        analysis.finished_at = Some(Utc::now());
        analysis.final_result = Some(final_result);
        self.persist_terminal(&mut analysis).await;

        if repo.is_archive() {
            if let Some(rid) = repo.archive_rid() {
                if let Err(e) = self.stager.cleanup(rid).await {
                    warn!(rid, error = %e, "post-analysis archive cleanup failed");
                }
            }
        }
    }

    async fn resolve_runner(&self) -> Result<Arc<dyn scanforge_runner::Runner>, DispatcherError> {
        let endpoint = self.store.find_or_advance_runner_endpoints().await?;
        let runner = self.runner_factory.runner_for(&endpoint).await?;
        Ok(runner)
    }

    async fn terminate_error(&self, analysis: &mut Analysis, message: &str) {
        analysis.status = AnalysisStatus::ErrorRunning;
        analysis.finished_at = Some(Utc::now());
        analysis.final_result = Some(FinalResult::Error);
        analysis.error_found = message.to_string();
        warn!(rid = %analysis.rid, error = message, "analysis terminated in error running");
        self.persist_terminal(analysis).await;
    }

    /// Open Question §9.3 resolution: retry the terminal write with a
    /// bounded backoff rather than logging once and leaving the record
    /// `running` forever.
    async fn persist_terminal(&self, analysis: &Analysis) {
        let mut attempt = 0u32;
        loop {
            match self.store.update_analysis_by_rid(analysis).await {
                Ok(()) => return,
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_TERMINAL_WRITE_ATTEMPTS {
                        error!(
                            rid = %analysis.rid,
                            attempts = attempt,
                            error = %e,
                            "terminal write exhausted retries; record remains stuck running"
                        );
                        return;
                    }
                    warn!(rid = %analysis.rid, attempt, error = %e, "terminal write failed, retrying");
                    tokio::time::sleep(TERMINAL_WRITE_BACKOFF * attempt).await;
                }
            }
        }
    }
}
