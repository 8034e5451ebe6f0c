//! HTTP uploader
//!
//! Deploys each file with a `PUT` to `<server>/<repository>/<path>`, tagging
//! it with build properties as matrix parameters and sending its SHA-256 so
//! the repository can verify the content.

use super::{UploadError, UploadRequest, UploadSummary, Uploader};
use crate::build::BuildInfo;
use crate::config::ServerDetails;
use crate::scan::SelectionEntry;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const CHECKSUM_HEADER: &str = "X-Checksum-Sha256";
const MAX_ERROR_BODY: usize = 512;

pub struct HttpUploader {
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deploygate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UploadError::Transport {
                file: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    async fn upload_one(
        &self,
        entry: &SelectionEntry,
        base_url: &str,
        server: &ServerDetails,
        build: Option<&BuildInfo>,
    ) -> Result<u64, UploadError> {
        let path = PathBuf::from(&entry.pattern);
        let content = tokio::fs::read(&path)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;
        let size = content.len() as u64;
        let checksum = hex::encode(Sha256::digest(&content));
        let url = target_url(base_url, &entry.target, build);

        debug!(file = %entry.pattern, url = %url, bytes = size, "PUT");

        let mut request = self
            .client
            .put(&url)
            .header(CHECKSUM_HEADER, checksum)
            .body(content);
        if let Some(token) = server.access_token.as_deref() {
            request = request.bearer_auth(token);
        } else if let Some(user) = server.user.as_deref() {
            request = request.basic_auth(user, server.password.as_deref());
        }

        let response = request.send().await.map_err(|e| UploadError::Transport {
            file: entry.pattern.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(size);
        }

        let mut message = response.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        Err(UploadError::Rejected {
            file: entry.pattern.clone(),
            target: entry.target.clone(),
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadSummary, UploadError> {
        let base_url = request
            .server
            .base_url()
            .ok_or(UploadError::MissingServerUrl)?;

        let uploads: Vec<_> = request
            .selection
            .files
            .iter()
            .map(|entry| self.upload_one(entry, base_url, request.server, request.build))
            .collect();
        let sizes: Vec<u64> = stream::iter(uploads)
            .buffer_unordered(request.threads.max(1))
            .try_collect()
            .await?;

        Ok(UploadSummary {
            files: sizes.len(),
            bytes: sizes.iter().sum(),
        })
    }
}

/// `<base>/<target>` plus build matrix parameters
///
/// Each path segment of the target and each property value is percent-encoded.
pub fn target_url(base_url: &str, target: &str, build: Option<&BuildInfo>) -> String {
    let path = target
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    if let Some(build) = build {
        url.push_str(";build.name=");
        url.push_str(&urlencoding::encode(&build.name));
        url.push_str(";build.number=");
        url.push_str(&urlencoding::encode(&build.number));
        if let Some(project) = &build.project {
            url.push_str(";build.project=");
            url.push_str(&urlencoding::encode(project));
        }
    }
    url
}
