//! Build and conditionally deploy
//!
//! [`DeployCommand`] wires the pieces together: resolve the project
//! configuration, run the build, then hand the artifact-details file to the
//! scan gate.

use crate::build::{
    resolve, should_create_artifacts_file, BuildError, BuildExecutor, BuildInfo, BuildInvocation,
    ConfigError, GradleExecutor, ProjectConfig,
};
use crate::config::{DeploygateConfig, ServerDetails};
use crate::manifest::ManifestReader;
use crate::pipeline::{
    dispose, PipelineConfig, PipelineContext, PipelineError, PipelineOutcome, PipelineStage,
    ResultHandle, RunFailure, ScanGateOrchestrator,
};
use crate::progress::ProgressHandler;
use crate::scan::{CommandScanner, ScanOutputFormat, Scanner};
use crate::upload::{HttpUploader, UploadError, Uploader};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One `build` invocation as requested by the user
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub tasks: Vec<String>,
    pub working_dir: PathBuf,
    pub project_config: PathBuf,
    pub threads: usize,
    pub detailed_summary: bool,
    pub scan: bool,
    pub scan_format: ScanOutputFormat,
    pub build: Option<BuildInfo>,
}

pub struct DeployCommand {
    executor: Arc<dyn BuildExecutor>,
    scanner: Arc<dyn Scanner>,
    uploader: Arc<dyn Uploader>,
    server: ServerDetails,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl DeployCommand {
    pub fn new(
        executor: Arc<dyn BuildExecutor>,
        scanner: Arc<dyn Scanner>,
        uploader: Arc<dyn Uploader>,
        server: ServerDetails,
    ) -> Self {
        Self {
            executor,
            scanner,
            uploader,
            server,
            progress_handler: None,
        }
    }

    /// Gradle, the external scanner and the HTTP uploader, configured from the environment
    pub fn from_config(config: &DeploygateConfig) -> Result<Self, UploadError> {
        Ok(Self::new(
            Arc::new(GradleExecutor::new(config.executor_settings())),
            Arc::new(CommandScanner::new(config.scanner.clone())),
            Arc::new(HttpUploader::new(config.upload_timeout())?),
            config.server.clone(),
        ))
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub async fn run(&self, request: &DeployRequest) -> Result<PipelineOutcome, RunFailure> {
        let prepared = self.build(request).await?;

        let context = PipelineContext::new(
            self.scanner.clone(),
            self.uploader.clone(),
            prepared.reader,
            self.server.clone(),
            request.build.clone(),
        );
        let orchestrator = ScanGateOrchestrator::new(context, self.progress_handler.clone());
        let mut outcome = orchestrator
            .run(
                prepared.artifacts_file.as_ref().map(|f| f.path()),
                &prepared.config,
            )
            .await?;

        // A deploying build's summary lists what the build itself deployed
        if outcome.stage == PipelineStage::ScanSkipped && request.detailed_summary {
            if let Some(file) = prepared.artifacts_file {
                let handle = ResultHandle::from_temp_path(file.into_temp_path());
                outcome.summary = dispose(handle, true)
                    .map_err(PipelineError::from)?
                    .into_handle();
            }
        }

        Ok(outcome)
    }

    /// Resolves the configuration and runs the build
    async fn build(&self, request: &DeployRequest) -> Result<PreparedRun, PipelineError> {
        let raw = ProjectConfig::from_file(&request.project_config)?;
        let resolved = resolve(&raw, request.threads, request.scan)?;

        if request.scan && self.server.base_url().is_none() {
            return Err(ConfigError::MissingServerDetails(
                "a server URL is required to scan and upload".to_string(),
            )
            .into());
        }
        if request.scan && resolved.deploy_repository().is_none() {
            return Err(ConfigError::MissingDeployRepository.into());
        }

        let artifacts_file = if should_create_artifacts_file(
            request.detailed_summary,
            resolved.deployment_disabled,
            request.scan,
        ) {
            let file = tempfile::Builder::new()
                .prefix("deployables")
                .suffix(".json")
                .tempfile()
                .map_err(BuildError::ArtifactsFile)?;
            debug!(path = %file.path().display(), "Created artifact details file");
            Some(file)
        } else {
            None
        };

        let resolved = match &artifacts_file {
            Some(file) => resolved.with_artifacts_file(file.path()),
            None => resolved,
        };

        let mut reader = ManifestReader::new();
        if let Some(repo) = resolved.deploy_repository() {
            reader = reader.with_default_repository(repo);
        }

        let invocation = BuildInvocation {
            tasks: request.tasks.clone(),
            properties: resolved.properties,
            use_wrapper: resolved.use_wrapper,
            use_plugin: resolved.use_plugin,
            working_dir: request.working_dir.clone(),
        };
        self.executor.execute(&invocation).await?;
        info!("Build finished");

        let config = PipelineConfig::new()
            .with_threads(request.threads)
            .with_scan(request.scan)
            .with_detailed_summary(request.detailed_summary)
            .with_deployment_disabled(resolved.deployment_disabled)
            .with_scan_format(request.scan_format);

        Ok(PreparedRun {
            artifacts_file,
            reader,
            config,
        })
    }
}

/// A finished build, ready for the scan gate
struct PreparedRun {
    artifacts_file: Option<NamedTempFile>,
    reader: ManifestReader,
    config: PipelineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::resolver::{DEPLOYABLE_ARTIFACTS_FILE, DEPLOY_ARTIFACTS};
    use crate::testing::{manifest_json, MockExecutor, MockScanner, MockUploader};
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str = "deployer:\n  repo: libs-release-local\n  serverId: main\n";

    fn server() -> ServerDetails {
        ServerDetails {
            url: Some("https://repo.example.com/artifactory".to_string()),
            ..Default::default()
        }
    }

    fn request(dir: &TempDir, scan: bool) -> DeployRequest {
        let project_config = dir.path().join("gradle.yaml");
        fs::write(&project_config, PROJECT).unwrap();
        DeployRequest {
            tasks: vec!["clean".to_string(), "publish".to_string()],
            working_dir: dir.path().to_path_buf(),
            project_config,
            threads: 2,
            detailed_summary: false,
            scan,
            scan_format: ScanOutputFormat::Json,
            build: None,
        }
    }

    #[tokio::test]
    async fn test_scan_run_passes_artifacts_file_to_build() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::with_manifest(manifest_json(2, 1)));
        let uploader = Arc::new(MockUploader::new());
        let command = DeployCommand::new(
            executor.clone(),
            Arc::new(MockScanner::passing()),
            uploader.clone(),
            server(),
        );

        let outcome = command.run(&request(&dir, true)).await.unwrap();

        assert_eq!(outcome.stage, PipelineStage::Done);
        assert_eq!(outcome.uploaded_files(), 3);
        let invocation = &executor.invocations()[0];
        assert_eq!(invocation.properties[DEPLOY_ARTIFACTS], "false");
        assert!(invocation.properties.contains_key(DEPLOYABLE_ARTIFACTS_FILE));
        assert_eq!(uploader.call_count(), 2);
    }

    #[tokio::test]
    async fn test_plain_build_skips_gate_without_manifest() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::succeeding());
        let uploader = Arc::new(MockUploader::new());
        let command = DeployCommand::new(
            executor.clone(),
            Arc::new(MockScanner::passing()),
            uploader.clone(),
            server(),
        );

        let outcome = command.run(&request(&dir, false)).await.unwrap();

        assert_eq!(outcome.stage, PipelineStage::ScanSkipped);
        assert_eq!(outcome.stages, vec![PipelineStage::Init, PipelineStage::ScanSkipped]);
        assert!(!executor.invocations()[0]
            .properties
            .contains_key(DEPLOYABLE_ARTIFACTS_FILE));
        assert_eq!(uploader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deploying_build_hands_off_artifacts_for_summary() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::with_manifest(manifest_json(1, 0)));
        let command = DeployCommand::new(
            executor,
            Arc::new(MockScanner::passing()),
            Arc::new(MockUploader::new()),
            server(),
        );
        let mut req = request(&dir, false);
        req.detailed_summary = true;

        let mut outcome = command.run(&req).await.unwrap();
        assert_eq!(outcome.stage, PipelineStage::ScanSkipped);
        let mut handle = outcome.take_summary().unwrap();
        assert!(handle.read_to_string().unwrap().contains("app-0.jar"));
        handle.close().unwrap();
    }

    #[tokio::test]
    async fn test_missing_deployer_fails_before_build() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::succeeding());
        let command = DeployCommand::new(
            executor.clone(),
            Arc::new(MockScanner::passing()),
            Arc::new(MockUploader::new()),
            server(),
        );
        let req = request(&dir, true);
        fs::write(&req.project_config, "resolver:\n  repo: libs-release\n").unwrap();

        let err = command.run(&req).await.unwrap_err();
        assert!(matches!(err.error, PipelineError::Config(ConfigError::MissingDeployer { .. })));
        assert!(executor.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_scan_without_server_url_fails_before_build() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::succeeding());
        let command = DeployCommand::new(
            executor.clone(),
            Arc::new(MockScanner::passing()),
            Arc::new(MockUploader::new()),
            ServerDetails::default(),
        );

        let err = command.run(&request(&dir, true)).await.unwrap_err();
        assert!(matches!(err.error, PipelineError::Config(ConfigError::MissingServerDetails(_))));
        assert!(executor.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let scanner = MockScanner::passing();
        let scans = scanner.call_counter();
        let command = DeployCommand::new(
            Arc::new(MockExecutor::failing(1)),
            Arc::new(scanner),
            Arc::new(MockUploader::new()),
            server(),
        );

        let err = command.run(&request(&dir, true)).await.unwrap_err();
        assert!(matches!(err.error, PipelineError::Build(BuildError::Failed { code: Some(1) })));
        assert_eq!(scans.get(), 0);
    }

    #[tokio::test]
    async fn test_scan_without_deploy_repository_fails_before_build() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(MockExecutor::succeeding());
        let command = DeployCommand::new(
            executor.clone(),
            Arc::new(MockScanner::passing()),
            Arc::new(MockUploader::new()),
            server(),
        );
        let req = request(&dir, true);
        fs::write(&req.project_config, "deployer:\n  serverId: main\n").unwrap();

        let err = command.run(&req).await.unwrap_err();
        assert!(matches!(
            err.error,
            PipelineError::Config(ConfigError::MissingDeployRepository)
        ));
        assert!(executor.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_still_returns_summary() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(MockUploader::new());
        uploader.fail_on(crate::manifest::ArtifactClass::Binary, 401);
        let command = DeployCommand::new(
            Arc::new(MockExecutor::with_manifest(manifest_json(1, 1))),
            Arc::new(MockScanner::passing()),
            uploader,
            server(),
        );
        let mut req = request(&dir, true);
        req.detailed_summary = true;

        let mut err = command.run(&req).await.unwrap_err();
        assert_eq!(err.kind(), crate::pipeline::ErrorKind::Upload);
        let mut handle = err.take_summary().expect("summary handle");
        assert!(!handle.read_to_string().unwrap().is_empty());
        handle.close().unwrap();
    }
}
