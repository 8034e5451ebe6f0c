//! Scan-gated conditional deployment
//!
//! After the build, the orchestrator parses the artifact manifest, asks the
//! scanner for a verdict and uploads only when the verdict passes. Binaries
//! go first and descriptors second, because descriptors reference binary
//! coordinates that consumers resolve as soon as the descriptor lands.

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::{PipelineError, RunFailure};
use super::handle::{dispose, Disposition, ResultHandle};
use super::outcome::{PipelineOutcome, UploadPhaseReport};
use super::stage::{PipelineStage, StageTracker};
use crate::manifest::BuildManifest;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::scan::{FileSelection, ScanRequest, ScanVerdict};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ScanGateOrchestrator {
    context: PipelineContext,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

/// State of one run while it is in flight
struct Run {
    id: Uuid,
    started: Instant,
    tracker: StageTracker,
    artifacts: usize,
    uploads: Vec<UploadPhaseReport>,
    violations: Vec<String>,
    summary: Option<ResultHandle>,
}

impl Run {
    fn finish(self) -> PipelineOutcome {
        let duration = self.started.elapsed();
        self.tracker.emit(&ProgressEvent::Completed {
            stage: self.tracker.current(),
            total_time: duration,
        });
        PipelineOutcome {
            run_id: self.id,
            stage: self.tracker.current(),
            stages: self.tracker.history().to_vec(),
            artifacts: self.artifacts,
            uploads: self.uploads,
            violations: self.violations,
            duration,
            summary: self.summary,
        }
    }

    /// Ends the run with an error, handing over any summary already handed off
    fn abort(&mut self, error: impl Into<PipelineError>) -> RunFailure {
        let error = error.into();
        self.tracker.advance(PipelineStage::Aborted);
        self.tracker.emit(&ProgressEvent::Failed {
            error: error.to_string(),
        });
        RunFailure::new(error, self.summary.take())
    }
}

impl ScanGateOrchestrator {
    pub fn new(context: PipelineContext, progress_handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self {
            context,
            progress_handler,
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Runs the gate over the artifacts listed at `manifest_path`
    ///
    /// Returns an outcome when nothing went wrong, including when the scan
    /// was skipped or rejected the artifacts and nothing was uploaded. A
    /// failure still carries the scan report when a detailed summary was
    /// requested.
    pub async fn run(
        &self,
        manifest_path: Option<&Path>,
        config: &PipelineConfig,
    ) -> Result<PipelineOutcome, RunFailure> {
        let mut run = Run {
            id: Uuid::new_v4(),
            started: Instant::now(),
            tracker: StageTracker::new(self.progress_handler.clone()),
            artifacts: 0,
            uploads: Vec::new(),
            violations: Vec::new(),
            summary: None,
        };
        run.tracker.emit(&ProgressEvent::Started {
            run_id: run.id.to_string(),
        });

        let Some(path) = manifest_path.filter(|p| !p.as_os_str().is_empty()) else {
            if config.scan_requested {
                warn!("Scan requested but the build produced no artifact details file");
            }
            run.tracker.advance(PipelineStage::ScanSkipped);
            return Ok(run.finish());
        };

        let manifest = match self.context.manifest_reader.read(path) {
            Ok(manifest) => manifest,
            Err(err) => return Err(run.abort(err)),
        };
        run.artifacts = manifest.len();
        run.tracker.advance(PipelineStage::ManifestParsed);

        if !config.scan_requested {
            info!(artifacts = run.artifacts, "Scan not requested, skipping conditional upload");
            run.tracker.advance(PipelineStage::ScanSkipped);
            return Ok(run.finish());
        }

        run.tracker.advance(PipelineStage::Scanning);
        let verdict = self.scan(&mut run, &manifest, config).await?;

        let (binaries, descriptors) = match verdict {
            ScanVerdict::Failed { violations } => {
                info!(
                    violations = violations.len(),
                    "Scan did not pass, nothing will be uploaded"
                );
                run.violations = violations;
                run.tracker.advance(PipelineStage::ScanFailed);
                return Ok(run.finish());
            }
            ScanVerdict::Passed {
                binaries,
                descriptors,
            } => (binaries, descriptors),
        };

        run.tracker.advance(PipelineStage::UploadBinaries);
        self.upload_phase(&mut run, &binaries, config).await?;

        run.tracker.advance(PipelineStage::UploadDescriptors);
        self.upload_phase(&mut run, &descriptors, config).await?;

        run.tracker.advance(PipelineStage::Done);
        Ok(run.finish())
    }

    /// Scans, disposes the result handle, and returns the verdict
    async fn scan(
        &self,
        run: &mut Run,
        manifest: &BuildManifest,
        config: &PipelineConfig,
    ) -> Result<ScanVerdict, RunFailure> {
        let scan_start = Instant::now();
        let response = self
            .context
            .scanner
            .scan(ScanRequest {
                manifest,
                server: &self.context.server,
                threads: config.threads,
                format: config.scan_format,
            })
            .await;

        // The handle is released or handed off before the verdict is looked at
        let disposal = response
            .handle
            .map(|handle| dispose(handle, config.detailed_summary_requested))
            .transpose();

        let verdict = match (response.verdict, disposal) {
            (Ok(verdict), Ok(disposition)) => {
                run.summary = disposition.and_then(Disposition::into_handle);
                verdict
            }
            (Ok(_), Err(err)) => return Err(run.abort(err)),
            (Err(err), disposal) => {
                match disposal {
                    Ok(disposition) => run.summary = disposition.and_then(Disposition::into_handle),
                    Err(dispose_err) => {
                        warn!(error = %dispose_err, "Failed to dispose of scan results")
                    }
                }
                return Err(run.abort(err));
            }
        };

        run.tracker.emit(&ProgressEvent::ScanComplete {
            passed: verdict.is_passed(),
            artifacts: manifest.len(),
            duration: scan_start.elapsed(),
        });
        Ok(verdict)
    }

    async fn upload_phase(
        &self,
        run: &mut Run,
        selection: &FileSelection,
        config: &PipelineConfig,
    ) -> Result<(), RunFailure> {
        if selection.is_empty() {
            return Ok(());
        }

        let phase_start = Instant::now();
        run.tracker.emit(&ProgressEvent::UploadStarted {
            class: selection.class,
            files: selection.len(),
        });

        let summary = match self
            .context
            .dispatcher
            .dispatch(
                selection,
                config.threads,
                self.context.build.as_ref(),
                &self.context.server,
            )
            .await
        {
            Ok(summary) => summary,
            Err(err) => return Err(run.abort(err)),
        };

        run.uploads.push(UploadPhaseReport {
            class: selection.class,
            files: summary.files,
            bytes: summary.bytes,
        });
        run.tracker.emit(&ProgressEvent::UploadComplete {
            class: selection.class,
            files: summary.files,
            duration: phase_start.elapsed(),
        });
        Ok(())
    }
}
