use super::{UploadError, UploadRequest, UploadSummary, Uploader};
use crate::build::BuildInfo;
use crate::config::ServerDetails;
use crate::scan::FileSelection;
use std::sync::Arc;
use tracing::{debug, info};

/// Issues one upload call per non-empty selection
#[derive(Clone)]
pub struct UploadDispatcher {
    uploader: Arc<dyn Uploader>,
}

impl UploadDispatcher {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }

    /// Uploads the whole selection in a single call
    ///
    /// An empty selection succeeds without contacting the uploader.
    pub async fn dispatch(
        &self,
        selection: &FileSelection,
        threads: usize,
        build: Option<&BuildInfo>,
        server: &ServerDetails,
    ) -> Result<UploadSummary, UploadError> {
        if selection.is_empty() {
            debug!(class = %selection.class, "Nothing to upload");
            return Ok(UploadSummary::default());
        }

        info!(class = %selection.class, files = selection.len(), threads, "Uploading");
        let summary = self
            .uploader
            .upload(UploadRequest {
                selection,
                threads,
                build,
                server,
            })
            .await?;

        info!(
            class = %selection.class,
            files = summary.files,
            bytes = summary.bytes,
            "Upload complete"
        );
        Ok(summary)
    }
}
