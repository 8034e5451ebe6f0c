//! Pipeline context for managing collaborators

use std::sync::Arc;

use crate::build::BuildInfo;
use crate::config::ServerDetails;
use crate::manifest::ManifestReader;
use crate::scan::Scanner;
use crate::upload::{UploadDispatcher, Uploader};

/// Context that owns all long-lived pipeline collaborators
#[derive(Clone)]
pub struct PipelineContext {
    /// Security scanner
    pub scanner: Arc<dyn Scanner>,

    /// Upload dispatcher wrapping the uploader
    pub dispatcher: UploadDispatcher,

    /// Parser for the build's artifact-details file
    pub manifest_reader: ManifestReader,

    /// Repository server scans and uploads talk to
    pub server: ServerDetails,

    /// Build identity attached to uploads
    pub build: Option<BuildInfo>,
}

impl PipelineContext {
    pub fn new(
        scanner: Arc<dyn Scanner>,
        uploader: Arc<dyn Uploader>,
        manifest_reader: ManifestReader,
        server: ServerDetails,
        build: Option<BuildInfo>,
    ) -> Self {
        Self {
            scanner,
            dispatcher: UploadDispatcher::new(uploader),
            manifest_reader,
            server,
            build,
        }
    }
}
