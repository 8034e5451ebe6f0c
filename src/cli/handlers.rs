//! Subcommand handlers
//!
//! Each handler returns the process exit code: 0 for success (whether or not
//! anything was deployed), 1 for a failed run and 2 for a configuration error.

use super::commands::{BuildArgs, ConfigArgs, InitScriptArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::build::init_script::{self, InitScriptAuth, INIT_SCRIPT_NAME};
use crate::build::BuildInfo;
use crate::command::{DeployCommand, DeployRequest};
use crate::config::DeploygateConfig;
use crate::pipeline::{ErrorKind, PipelineError, PipelineOutcome, ResultHandle};
use crate::progress::LoggingHandler;
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Exit code for a run that returned an error
pub fn exit_code_for(err: &PipelineError) -> i32 {
    match err.kind() {
        ErrorKind::Config => EXIT_CONFIG_ERROR,
        _ => EXIT_FAILURE,
    }
}

fn load_config() -> Option<DeploygateConfig> {
    let config = DeploygateConfig::default();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your DEPLOYGATE_* environment variables.");
        return None;
    }
    Some(config)
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    info!("Starting build");

    let Some(config) = load_config() else {
        return EXIT_CONFIG_ERROR;
    };

    let build = match BuildInfo::from_parts(
        args.build_name.clone(),
        args.build_number.clone(),
        args.project.clone(),
    ) {
        Ok(build) => build,
        Err(e) => {
            error!("{}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let working_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to get current directory: {}", e);
            return EXIT_FAILURE;
        }
    };

    let command = match DeployCommand::from_config(&config) {
        Ok(command) => command.with_progress_handler(Arc::new(LoggingHandler)),
        Err(e) => {
            error!("Failed to initialize uploader: {}", e);
            return EXIT_FAILURE;
        }
    };

    let request = DeployRequest {
        tasks: args.tasks.clone(),
        working_dir,
        project_config: args
            .config
            .clone()
            .unwrap_or_else(|| config.project_config.clone()),
        threads: args.threads,
        detailed_summary: args.detailed_summary,
        scan: args.scan,
        scan_format: args.scan_format.into(),
        build,
    };
    debug!(?request, "Deploy request");

    let formatter = OutputFormatter::new(args.format.into());
    match command.run(&request).await {
        Ok(outcome) => match print_outcome(&formatter, outcome) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                error!("{:#}", e);
                EXIT_FAILURE
            }
        },
        Err(mut failure) => {
            error!(kind = ?failure.kind(), "{}", failure);
            if let Some(handle) = failure.take_summary() {
                if let Err(e) = print_summary(&formatter, handle) {
                    error!("{:#}", e);
                }
            }
            exit_code_for(&failure.error)
        }
    }
}

/// Prints the run report, then the detailed summary if one was handed off
fn print_outcome(formatter: &OutputFormatter, mut outcome: PipelineOutcome) -> Result<()> {
    let report = formatter.format_outcome(&outcome.report())?;
    println!("{}", report);

    if let Some(handle) = outcome.take_summary() {
        print_summary(formatter, handle)?;
    }
    Ok(())
}

/// Reads the handed-off report once, prints it and releases it
fn print_summary(formatter: &OutputFormatter, mut handle: ResultHandle) -> Result<()> {
    let summary = handle.read_to_string();
    let released = handle.close();
    let summary = summary.context("Failed to read detailed summary")?;
    released.context("Failed to release detailed summary")?;

    if formatter.format() == OutputFormat::Human {
        println!("Detailed summary:");
    }
    println!("{}", summary.trim_end());
    Ok(())
}

pub async fn handle_init_script(args: &InitScriptArgs) -> i32 {
    let Some(config) = load_config() else {
        return EXIT_CONFIG_ERROR;
    };

    match write_init_script(&config, &args.repo) {
        Ok(path) => {
            println!("{}", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_CONFIG_ERROR
        }
    }
}

fn write_init_script(config: &DeploygateConfig, repo: &str) -> Result<std::path::PathBuf> {
    let server = &config.server;
    let auth = InitScriptAuth::new(
        server.base_url().unwrap_or_default(),
        repo,
        server.user.as_deref(),
        server.password.as_deref(),
        server.access_token.as_deref(),
    );
    let script = init_script::generate(&auth)?;
    let home = config
        .gradle_user_home
        .as_deref()
        .context("Cannot determine the Gradle user home; set GRADLE_USER_HOME")?;
    Ok(init_script::write(home, INIT_SCRIPT_NAME, &script)?)
}

pub async fn handle_config(args: &ConfigArgs) -> i32 {
    let config = DeploygateConfig::default();
    let formatter = OutputFormatter::new(args.format.into());

    match formatter.format_config(&config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{:#}", e);
            return EXIT_FAILURE;
        }
    }

    match config.validate() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("Configuration error: {}", e);
            EXIT_CONFIG_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildError, ConfigError};
    use crate::manifest::ManifestError;
    use crate::upload::UploadError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let config: PipelineError = ConfigError::MissingDeployer {
            section: "deployer",
        }
        .into();
        assert_eq!(exit_code_for(&config), EXIT_CONFIG_ERROR);

        let manifest: PipelineError = ManifestError::NotFound(PathBuf::from("a.json")).into();
        assert_eq!(exit_code_for(&manifest), EXIT_FAILURE);

        let upload: PipelineError = UploadError::MissingServerUrl.into();
        assert_eq!(exit_code_for(&upload), EXIT_FAILURE);

        let build: PipelineError = BuildError::Failed { code: Some(1) }.into();
        assert_eq!(exit_code_for(&build), EXIT_FAILURE);
    }

    #[test]
    fn test_print_summary_releases_report() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"violations\":[]}\n").unwrap();
        let path = file.path().to_path_buf();
        let handle = ResultHandle::from_temp_path(file.into_temp_path());
        let handle = crate::pipeline::dispose(handle, true)
            .unwrap()
            .into_handle()
            .unwrap();

        print_summary(&OutputFormatter::new(OutputFormat::Json), handle).unwrap();
        assert!(!path.exists());
    }
}
