use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving the build configuration
///
/// All of these are raised before the build executor runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scan was requested but there is nowhere to deploy to
    #[error("Conditional upload can only be performed if a '{section}' section is set in the project configuration")]
    MissingDeployer { section: &'static str },

    /// A scan was requested but the deployer names no repository
    #[error("Conditional upload requires 'deployer.repo' in the project configuration")]
    MissingDeployRepository,

    /// The project configuration file does not exist
    #[error("Project configuration file not found: {0}")]
    ProjectFileNotFound(PathBuf),

    /// The project configuration file could not be parsed
    #[error("Invalid project configuration file {path}: {message}")]
    InvalidProjectFile { path: PathBuf, message: String },

    /// Server details needed for scan or upload are missing
    #[error("Missing server details: {0}")]
    MissingServerDetails(String),

    /// Build information could not be determined
    #[error("Invalid build information: {0}")]
    InvalidBuildInfo(String),
}

/// Errors raised by the build executor
#[derive(Debug, Error)]
pub enum BuildError {
    /// The build tool could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The build tool ran and exited unsuccessfully
    #[error("Build failed with exit code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Failed { code: Option<i32> },

    /// Build properties could not be written
    #[error("Failed to write build properties: {0}")]
    Properties(#[source] std::io::Error),

    /// The artifact-details file could not be created
    #[error("Failed to create artifact details file: {0}")]
    ArtifactsFile(#[source] std::io::Error),
}
