//! Pipeline stages
//!
//! ```text
//! Init -> ManifestParsed -> Scanning -> UploadBinaries -> UploadDescriptors -> Done
//! Init -> ScanSkipped | Aborted
//! ManifestParsed -> ScanSkipped
//! Scanning -> ScanFailed | Aborted
//! UploadBinaries | UploadDescriptors -> Aborted
//! ```

use crate::progress::{ProgressEvent, ProgressHandler};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    ManifestParsed,
    ScanSkipped,
    Scanning,
    UploadBinaries,
    UploadDescriptors,
    Done,
    ScanFailed,
    Aborted,
}

impl PipelineStage {
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Init, ManifestParsed)
                | (Init, ScanSkipped)
                | (Init, Aborted)
                | (ManifestParsed, ScanSkipped)
                | (ManifestParsed, Scanning)
                | (Scanning, UploadBinaries)
                | (Scanning, ScanFailed)
                | (Scanning, Aborted)
                | (UploadBinaries, UploadDescriptors)
                | (UploadBinaries, Aborted)
                | (UploadDescriptors, Done)
                | (UploadDescriptors, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStage::ScanSkipped
                | PipelineStage::Done
                | PipelineStage::ScanFailed
                | PipelineStage::Aborted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::ManifestParsed => "manifest_parsed",
            PipelineStage::ScanSkipped => "scan_skipped",
            PipelineStage::Scanning => "scanning",
            PipelineStage::UploadBinaries => "upload_binaries",
            PipelineStage::UploadDescriptors => "upload_descriptors",
            PipelineStage::Done => "done",
            PipelineStage::ScanFailed => "scan_failed",
            PipelineStage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of one run and reports every transition
pub(crate) struct StageTracker {
    current: PipelineStage,
    history: Vec<PipelineStage>,
    handler: Option<Arc<dyn ProgressHandler>>,
}

impl StageTracker {
    pub(crate) fn new(handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self {
            current: PipelineStage::Init,
            history: vec![PipelineStage::Init],
            handler,
        }
    }

    pub(crate) fn current(&self) -> PipelineStage {
        self.current
    }

    pub(crate) fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    pub(crate) fn advance(&mut self, next: PipelineStage) {
        let from = self.current;
        debug_assert!(
            from.can_transition_to(next),
            "illegal pipeline transition {} -> {}",
            from,
            next
        );
        debug!(from = %from, to = %next, "Pipeline transition");
        self.current = next;
        self.history.push(next);
        self.emit(&ProgressEvent::StageChanged { from, to: next });
    }

    pub(crate) fn emit(&self, event: &ProgressEvent) {
        if let Some(handler) = &self.handler {
            handler.on_progress(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineStage::*;

    const ALL: [PipelineStage; 9] = [
        Init,
        ManifestParsed,
        ScanSkipped,
        Scanning,
        UploadBinaries,
        UploadDescriptors,
        Done,
        ScanFailed,
        Aborted,
    ];

    #[test]
    fn test_happy_path_is_legal() {
        let path = [
            Init,
            ManifestParsed,
            Scanning,
            UploadBinaries,
            UploadDescriptors,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_terminal_stages_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_descriptors_never_before_binaries() {
        assert!(!Scanning.can_transition_to(UploadDescriptors));
        assert!(!ManifestParsed.can_transition_to(UploadBinaries));
    }

    #[test]
    fn test_tracker_records_history() {
        let mut tracker = StageTracker::new(None);
        tracker.advance(ManifestParsed);
        tracker.advance(ScanSkipped);
        assert_eq!(tracker.current(), ScanSkipped);
        assert_eq!(tracker.history(), &[Init, ManifestParsed, ScanSkipped]);
    }

    #[test]
    #[should_panic(expected = "illegal pipeline transition")]
    #[cfg(debug_assertions)]
    fn test_tracker_rejects_illegal_transition() {
        let mut tracker = StageTracker::new(None);
        tracker.advance(UploadDescriptors);
    }

    #[test]
    fn test_display() {
        assert_eq!(UploadBinaries.to_string(), "upload_binaries");
    }
}
