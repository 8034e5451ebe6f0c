//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => {
                info!(run_id = %run_id, "Starting deployment pipeline");
            }
            ProgressEvent::StageChanged { from, to } => {
                debug!(from = %from, to = %to, "Stage changed");
            }
            ProgressEvent::ScanComplete {
                passed,
                artifacts,
                duration,
            } => {
                if *passed {
                    info!(
                        artifacts,
                        scan_time_ms = duration.as_millis(),
                        "Scan passed"
                    );
                } else {
                    warn!(
                        artifacts,
                        scan_time_ms = duration.as_millis(),
                        "Scan did not pass, nothing will be deployed"
                    );
                }
            }
            ProgressEvent::UploadStarted { class, files } => {
                info!(class = %class, files, "Starting upload");
            }
            ProgressEvent::UploadComplete {
                class,
                files,
                duration,
            } => {
                info!(
                    class = %class,
                    files,
                    duration_ms = duration.as_millis(),
                    "Upload phase complete"
                );
            }
            ProgressEvent::Completed { stage, total_time } => {
                info!(
                    stage = %stage,
                    total_time_ms = total_time.as_millis(),
                    "Pipeline complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Pipeline failed");
            }
        }
    }
}
