//! Security scanning of build artifacts
//!
//! The scanner is a collaborator: it receives the build manifest and answers
//! with a [`ScanVerdict`] plus a [`ResultHandle`] over its report. A verdict
//! is explicit so "the scan rejected the artifacts" cannot be confused with
//! "there was nothing to upload":
//!
//! - `Ok(ScanVerdict::Passed { .. })`: upload the selections
//! - `Ok(ScanVerdict::Failed { .. })`: upload nothing, not an error
//! - `Err(ScanError)`: the scanner could not produce a verdict

pub mod command;
pub mod selection;

pub use command::{CommandScanner, ScannerSettings};
pub use selection::{partition, FileSelection, SelectionEntry};

use crate::config::ServerDetails;
use crate::manifest::BuildManifest;
use crate::pipeline::handle::ResultHandle;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanner could not be started
    #[error("Failed to start scanner '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scanner ran but did not produce a verdict
    #[error("Scanner exited with code {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Engine { code: Option<i32>, stderr: String },

    /// The scan input or report could not be handled
    #[error("Scan report error: {0}")]
    Report(String),
}

/// The scanner's decision on a build's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    /// No violations; the selections may be uploaded
    Passed {
        binaries: FileSelection,
        descriptors: FileSelection,
    },
    /// Policy violations found; nothing may be uploaded
    Failed { violations: Vec<String> },
}

impl ScanVerdict {
    /// Passing verdict covering every artifact in the manifest
    pub fn passed_for(manifest: &BuildManifest) -> Self {
        let (binaries, descriptors) = partition(manifest);
        ScanVerdict::Passed {
            binaries,
            descriptors,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, ScanVerdict::Passed { .. })
    }
}

/// Report format requested from the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOutputFormat {
    #[default]
    Table,
    Json,
    SimpleJson,
    Sarif,
}

impl fmt::Display for ScanOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanOutputFormat::Table => "table",
            ScanOutputFormat::Json => "json",
            ScanOutputFormat::SimpleJson => "simple-json",
            ScanOutputFormat::Sarif => "sarif",
        };
        f.write_str(name)
    }
}

/// Input to one scan
#[derive(Debug, Clone, Copy)]
pub struct ScanRequest<'a> {
    pub manifest: &'a BuildManifest,
    pub server: &'a ServerDetails,
    pub threads: usize,
    pub format: ScanOutputFormat,
}

/// What the scanner hands back
///
/// The handle may be present even when the verdict is an error; it must be
/// disposed either way.
#[derive(Debug)]
pub struct ScanResponse {
    pub verdict: Result<ScanVerdict, ScanError>,
    pub handle: Option<ResultHandle>,
}

impl ScanResponse {
    pub fn new(verdict: Result<ScanVerdict, ScanError>, handle: Option<ResultHandle>) -> Self {
        Self { verdict, handle }
    }
}

#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, request: ScanRequest<'_>) -> ScanResponse;
}
