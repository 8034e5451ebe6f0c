//! Artifact upload
//!
//! The [`Uploader`] collaborator takes a whole [`FileSelection`] and either
//! uploads all of it or fails. The [`UploadDispatcher`] sits in front of it
//! and skips empty selections.

pub mod dispatcher;
pub mod http;

pub use dispatcher::UploadDispatcher;
pub use http::HttpUploader;

use crate::build::BuildInfo;
use crate::config::ServerDetails;
use crate::scan::FileSelection;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    /// No repository URL to upload to
    #[error("No server URL configured for upload")]
    MissingServerUrl,

    /// A local file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The repository refused a file
    #[error("Upload of {file} to {target} rejected with status {status}: {message}")]
    Rejected {
        file: String,
        target: String,
        status: u16,
        message: String,
    },

    /// The request never got a response
    #[error("Upload of {file} failed: {message}")]
    Transport { file: String, message: String },
}

/// Input to one upload call
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub selection: &'a FileSelection,
    pub threads: usize,
    pub build: Option<&'a BuildInfo>,
    pub server: &'a ServerDetails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadSummary, UploadError>;
}
