//! deploygate - scan-gated conditional deployment for Gradle builds
//!
//! Runs a build against an artifact repository, optionally scans the
//! artifacts it produced, and uploads them only when the scan passes.
//!
//! # Core Concepts
//!
//! - **Manifest**: the artifacts a build produced, read from the build's
//!   artifact-details file ([`manifest`])
//! - **Verdict**: the scanner's decision on those artifacts, with the
//!   upload-eligible selections when it passed ([`scan`])
//! - **Gate**: the point where upload proceeds only if the verdict passed
//!   ([`pipeline::ScanGateOrchestrator`])
//! - **Result handle**: the scanner's report, closed right after the gate or
//!   handed off for the detailed summary ([`pipeline::handle`])
//!
//! # Example Usage
//!
//! ```ignore
//! use deploygate::{DeployCommand, DeployRequest, DeploygateConfig};
//!
//! async fn deploy(request: DeployRequest) -> anyhow::Result<()> {
//!     let config = DeploygateConfig::default();
//!     config.validate()?;
//!
//!     let outcome = DeployCommand::from_config(&config)?.run(&request).await?;
//!     println!("{:?}: {} file(s) uploaded", outcome.kind(), outcome.uploaded_files());
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`build`]: project configuration, property resolution and the build executor
//! - [`scan`]: scanner collaborator and file selections
//! - [`upload`]: uploader collaborator and dispatcher
//! - [`pipeline`]: the scan gate, its stages, outcome and errors
//! - [`command`]: build followed by the scan gate

pub mod build;
pub mod cli;
pub mod command;
pub mod config;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod testing;
pub mod upload;
pub mod util;

pub use command::{DeployCommand, DeployRequest};
pub use config::{DeploygateConfig, EnvConfigError, ServerDetails};
pub use manifest::{ArtifactClass, ArtifactRecord, BuildManifest, ManifestError, ManifestReader};
pub use pipeline::{
    OutcomeKind, PipelineConfig, PipelineError, PipelineOutcome, PipelineStage, ResultHandle,
    RunFailure, ScanGateOrchestrator,
};
pub use scan::{ScanError, ScanVerdict, Scanner};
pub use upload::{UploadError, Uploader};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_deploygate() {
        assert_eq!(NAME, "deploygate");
    }
}
