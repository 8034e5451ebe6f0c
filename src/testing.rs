//! Scripted collaborators for tests
//!
//! Each mock records what it was asked to do so tests can assert on call
//! counts, ordering and arguments without a scanner binary or a repository
//! server.

use crate::build::resolver::DEPLOYABLE_ARTIFACTS_FILE;
use crate::build::{BuildError, BuildExecutor, BuildInfo, BuildInvocation};
use crate::manifest::{ArtifactClass, BuildManifest};
use crate::pipeline::handle::ResultHandle;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::scan::{ScanError, ScanOutputFormat, ScanRequest, ScanResponse, ScanVerdict, Scanner};
use crate::upload::{UploadError, UploadRequest, UploadSummary, Uploader};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, TempPath};

/// Writes an artifact-details file with `binaries` jars and `descriptors` poms
pub fn write_manifest(dir: &TempDir, binaries: usize, descriptors: usize) -> PathBuf {
    let path = dir.path().join("artifacts.json");
    std::fs::write(&path, manifest_json(binaries, descriptors)).unwrap();
    path
}

/// Artifact-details JSON for a single `app` module
pub fn manifest_json(binaries: usize, descriptors: usize) -> String {
    let mut artifacts = Vec::new();
    for i in 0..binaries {
        artifacts.push(serde_json::json!({
            "sourcePath": format!("build/libs/app-{}.jar", i),
            "artifactDest": format!("com/example/app/1.0/app-{}.jar", i),
        }));
    }
    for i in 0..descriptors {
        artifacts.push(serde_json::json!({
            "sourcePath": format!("build/publications/app-{}.pom", i),
            "artifactDest": format!("com/example/app/1.0/app-{}.pom", i),
        }));
    }
    serde_json::json!({ "app": artifacts }).to_string()
}

#[derive(Debug, Clone)]
enum ScriptedVerdict {
    Pass,
    Fail(Vec<String>),
    Error,
}

/// Shared count of scanner invocations
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// What the scanner saw on one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCall {
    pub artifacts: usize,
    pub threads: usize,
    pub format: ScanOutputFormat,
}

/// Scanner that answers with a fixed verdict and a report file
pub struct MockScanner {
    verdict: ScriptedVerdict,
    report: Mutex<Option<TempPath>>,
    report_path: PathBuf,
    calls: CallCounter,
    seen: Mutex<Vec<ScanCall>>,
}

impl MockScanner {
    fn scripted(verdict: ScriptedVerdict, report: Option<&str>) -> Self {
        let temp = report.map(|content| {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(content.as_bytes()).unwrap();
            file.into_temp_path()
        });
        let report_path = temp
            .as_ref()
            .map(|t| t.to_path_buf())
            .unwrap_or_default();
        Self {
            verdict,
            report: Mutex::new(temp),
            report_path,
            calls: CallCounter::default(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Passes every artifact in the manifest
    pub fn passing() -> Self {
        Self::scripted(ScriptedVerdict::Pass, Some(r#"{"violations":[]}"#))
    }

    /// Rejects the artifacts with the given violations
    pub fn failing(violations: Vec<String>) -> Self {
        let report = serde_json::json!({ "violations": violations }).to_string();
        Self::scripted(ScriptedVerdict::Fail(violations), Some(&report))
    }

    /// Fails to produce a verdict but still leaves a report behind
    pub fn erroring() -> Self {
        Self::scripted(ScriptedVerdict::Error, Some("scanner crashed"))
    }

    /// Passes but hands back no result handle
    pub fn passing_without_report() -> Self {
        Self::scripted(ScriptedVerdict::Pass, None)
    }

    pub fn call_counter(&self) -> CallCounter {
        self.calls.clone()
    }

    /// Location of the report file the handle wraps
    pub fn report_path(&self) -> PathBuf {
        self.report_path.clone()
    }

    pub fn calls(&self) -> Vec<ScanCall> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, request: ScanRequest<'_>) -> ScanResponse {
        self.calls.increment();
        self.seen.lock().unwrap().push(ScanCall {
            artifacts: request.manifest.len(),
            threads: request.threads,
            format: request.format,
        });

        let handle = self
            .report
            .lock()
            .unwrap()
            .take()
            .map(ResultHandle::from_temp_path);
        let verdict = match &self.verdict {
            ScriptedVerdict::Pass => Ok(ScanVerdict::passed_for(request.manifest)),
            ScriptedVerdict::Fail(violations) => Ok(ScanVerdict::Failed {
                violations: violations.clone(),
            }),
            ScriptedVerdict::Error => Err(ScanError::Engine {
                code: Some(2),
                stderr: "scanner crashed".to_string(),
            }),
        };
        ScanResponse::new(verdict, handle)
    }
}

/// One recorded upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub class: ArtifactClass,
    pub files: usize,
    pub threads: usize,
    pub build: Option<BuildInfo>,
}

/// Uploader that records calls and fails on request
#[derive(Default)]
pub struct MockUploader {
    calls: Mutex<Vec<UploadCall>>,
    failures: Mutex<Vec<(ArtifactClass, u16)>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every upload of `class` with `status`
    pub fn fail_on(&self, class: ArtifactClass, status: u16) {
        self.failures.lock().unwrap().push((class, status));
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Uploader for MockUploader {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadSummary, UploadError> {
        let class = request.selection.class;
        self.calls.lock().unwrap().push(UploadCall {
            class,
            files: request.selection.len(),
            threads: request.threads,
            build: request.build.cloned(),
        });

        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, status)| *status);
        if let Some(status) = failure {
            let first = request.selection.files.first();
            return Err(UploadError::Rejected {
                file: first.map(|f| f.pattern.clone()).unwrap_or_default(),
                target: first.map(|f| f.target.clone()).unwrap_or_default(),
                status,
                message: "rejected by mock".to_string(),
            });
        }

        Ok(UploadSummary {
            files: request.selection.len(),
            bytes: 0,
        })
    }
}

/// Build executor that optionally writes an artifact-details file
#[derive(Default)]
pub struct MockExecutor {
    manifest: Option<String>,
    exit_code: Option<i32>,
    invocations: Mutex<Vec<BuildInvocation>>,
}

impl MockExecutor {
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Succeeds and writes `content` to the requested artifacts file
    pub fn with_manifest(content: impl Into<String>) -> Self {
        Self {
            manifest: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<BuildInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildExecutor for MockExecutor {
    async fn execute(&self, invocation: &BuildInvocation) -> Result<(), BuildError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        if let Some(code) = self.exit_code {
            return Err(BuildError::Failed { code: Some(code) });
        }
        if let (Some(content), Some(path)) = (
            &self.manifest,
            invocation.properties.get(DEPLOYABLE_ARTIFACTS_FILE),
        ) {
            std::fs::write(Path::new(path), content).map_err(BuildError::Properties)?;
        }
        Ok(())
    }
}

/// Progress handler that keeps every event
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_matching(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Parsed manifest with the same shape as [`manifest_json`]
pub fn manifest(binaries: usize, descriptors: usize) -> BuildManifest {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, binaries, descriptors);
    crate::manifest::ManifestReader::new()
        .with_default_repository("libs-release-local")
        .read(&path)
        .unwrap()
}
