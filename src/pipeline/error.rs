use super::handle::{HandleError, ResultHandle};
use crate::build::{BuildError, ConfigError};
use crate::manifest::ManifestError;
use crate::scan::ScanError;
use crate::upload::UploadError;
use std::fmt;
use thiserror::Error;

/// Any failure of a deployment run
///
/// Collaborator errors are wrapped transparently, so their message and
/// source chain reach the caller unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Resource(#[from] HandleError),
}

/// Coarse error category, used for exit codes and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Build,
    ManifestParse,
    Scan,
    Upload,
    Resource,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Build(_) => ErrorKind::Build,
            PipelineError::Manifest(_) => ErrorKind::ManifestParse,
            PipelineError::Scan(_) => ErrorKind::Scan,
            PipelineError::Upload(_) => ErrorKind::Upload,
            PipelineError::Resource(_) => ErrorKind::Resource,
        }
    }
}

/// A failed run, carrying the detailed summary if it was already handed off
///
/// The scan report stays readable after a scan or upload failure so the
/// caller can still print it.
#[derive(Debug)]
pub struct RunFailure {
    pub error: PipelineError,
    summary: Option<ResultHandle>,
}

impl RunFailure {
    pub fn new(error: impl Into<PipelineError>, summary: Option<ResultHandle>) -> Self {
        Self {
            error: error.into(),
            summary,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn take_summary(&mut self) -> Option<ResultHandle> {
        self.summary.take()
    }

    pub fn has_summary(&self) -> bool {
        self.summary.is_some()
    }
}

impl From<PipelineError> for RunFailure {
    fn from(error: PipelineError) -> Self {
        Self::new(error, None)
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}
