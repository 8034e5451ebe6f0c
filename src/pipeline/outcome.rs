use super::handle::ResultHandle;
use super::stage::PipelineStage;
use crate::manifest::ArtifactClass;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// What a successful run did, from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The build succeeded and nothing was deployed (scan skipped or not passed)
    NothingDeployed,
    /// At least one file was uploaded
    Deployed,
}

/// One completed upload phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadPhaseReport {
    pub class: ArtifactClass,
    pub files: usize,
    pub bytes: u64,
}

/// Result of a pipeline run that did not fail
#[derive(Debug)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub stage: PipelineStage,
    pub stages: Vec<PipelineStage>,
    pub artifacts: usize,
    pub uploads: Vec<UploadPhaseReport>,
    pub violations: Vec<String>,
    pub duration: Duration,
    pub(crate) summary: Option<ResultHandle>,
}

impl PipelineOutcome {
    pub fn kind(&self) -> OutcomeKind {
        if self.uploaded_files() > 0 {
            OutcomeKind::Deployed
        } else {
            OutcomeKind::NothingDeployed
        }
    }

    pub fn uploaded_files(&self) -> usize {
        self.uploads.iter().map(|u| u.files).sum()
    }

    /// Scan report handed off for the detailed summary, if one was requested
    pub fn take_summary(&mut self) -> Option<ResultHandle> {
        self.summary.take()
    }

    pub fn has_summary(&self) -> bool {
        self.summary.is_some()
    }

    /// Serializable view for output formatting
    pub fn report(&self) -> OutcomeReport {
        OutcomeReport {
            run_id: self.run_id.to_string(),
            stage: self.stage,
            outcome: self.kind(),
            artifacts: self.artifacts,
            uploads: self.uploads.clone(),
            violations: self.violations.clone(),
            duration_ms: self.duration.as_millis() as u64,
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub run_id: String,
    pub stage: PipelineStage,
    pub outcome: OutcomeKind,
    pub artifacts: usize,
    pub uploads: Vec<UploadPhaseReport>,
    pub violations: Vec<String>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(uploads: Vec<UploadPhaseReport>) -> PipelineOutcome {
        PipelineOutcome {
            run_id: Uuid::new_v4(),
            stage: PipelineStage::Done,
            stages: vec![PipelineStage::Init, PipelineStage::Done],
            artifacts: 2,
            uploads,
            violations: Vec::new(),
            duration: Duration::from_millis(12),
            summary: None,
        }
    }

    #[test]
    fn test_kind_depends_on_uploaded_files() {
        assert_eq!(outcome(Vec::new()).kind(), OutcomeKind::NothingDeployed);

        let deployed = outcome(vec![UploadPhaseReport {
            class: ArtifactClass::Binary,
            files: 2,
            bytes: 10,
        }]);
        assert_eq!(deployed.kind(), OutcomeKind::Deployed);
        assert_eq!(deployed.uploaded_files(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let report = outcome(Vec::new()).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "done");
        assert_eq!(json["outcome"], "nothing_deployed");
        assert_eq!(json["duration_ms"], 12);
    }
}
