//! Progress handler trait and events

use crate::manifest::ArtifactClass;
use crate::pipeline::stage::PipelineStage;
use std::time::Duration;

/// Events emitted while a pipeline run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { run_id: String },

    /// The run moved from one stage to the next
    StageChanged {
        from: PipelineStage,
        to: PipelineStage,
    },

    /// The scanner answered
    ScanComplete {
        passed: bool,
        artifacts: usize,
        duration: Duration,
    },

    /// An upload phase started
    UploadStarted { class: ArtifactClass, files: usize },

    /// An upload phase finished
    UploadComplete {
        class: ArtifactClass,
        files: usize,
        duration: Duration,
    },

    /// Run finished without error
    Completed {
        stage: PipelineStage,
        total_time: Duration,
    },

    /// Run failed
    Failed { error: String },
}

/// Trait for handling progress events during a pipeline run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
