//! Build executor
//!
//! Runs the build tool with the resolved properties. The executor is opaque to
//! the deployment pipeline: all that matters afterwards is whether it succeeded
//! and, when requested, the artifact-details file it wrote.

use super::BuildError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Everything needed to run one build
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    pub tasks: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub use_wrapper: bool,
    pub use_plugin: bool,
    pub working_dir: PathBuf,
}

#[async_trait]
pub trait BuildExecutor: Send + Sync {
    async fn execute(&self, invocation: &BuildInvocation) -> Result<(), BuildError>;
}

/// Settings for [`GradleExecutor`]
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Environment variable the properties file path is exported through
    pub properties_env: String,
    /// Init script applied when the build does not use the plugin
    pub extractor_init_script: Option<PathBuf>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            properties_env: "BUILDINFO_PROPFILE".to_string(),
            extractor_init_script: None,
        }
    }
}

/// Runs Gradle as a child process
#[derive(Debug, Clone, Default)]
pub struct GradleExecutor {
    settings: ExecutorSettings,
}

impl GradleExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    fn program(use_wrapper: bool, working_dir: &Path) -> PathBuf {
        if !use_wrapper {
            return PathBuf::from("gradle");
        }
        if cfg!(windows) {
            working_dir.join("gradlew.bat")
        } else {
            working_dir.join("gradlew")
        }
    }

    fn arguments(&self, invocation: &BuildInvocation) -> Vec<String> {
        let mut args = Vec::new();
        if !invocation.use_plugin {
            if let Some(script) = &self.settings.extractor_init_script {
                args.push("--init-script".to_string());
                args.push(script.display().to_string());
            }
        }
        args.extend(invocation.tasks.iter().cloned());
        args
    }
}

#[async_trait]
impl BuildExecutor for GradleExecutor {
    async fn execute(&self, invocation: &BuildInvocation) -> Result<(), BuildError> {
        let properties_file = write_properties(&invocation.properties)?;
        let program = Self::program(invocation.use_wrapper, &invocation.working_dir);
        let args = self.arguments(invocation);

        info!(
            program = %program.display(),
            tasks = ?invocation.tasks,
            "Running build"
        );
        debug!(
            properties = %properties_file.path().display(),
            env = %self.settings.properties_env,
            "Build properties written"
        );

        let status = Command::new(&program)
            .args(&args)
            .current_dir(&invocation.working_dir)
            .env(&self.settings.properties_env, properties_file.path())
            .status()
            .await
            .map_err(|source| BuildError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Failed {
                code: status.code(),
            })
        }
    }
}

/// Writes properties in Java `.properties` syntax to a temporary file
pub fn write_properties(
    properties: &BTreeMap<String, String>,
) -> Result<tempfile::NamedTempFile, BuildError> {
    let mut file = tempfile::Builder::new()
        .prefix("buildinfo")
        .suffix(".properties")
        .tempfile()
        .map_err(BuildError::Properties)?;

    file.write_all(render_properties(properties).as_bytes())
        .map_err(BuildError::Properties)?;
    file.flush().map_err(BuildError::Properties)?;
    Ok(file)
}

pub(crate) fn render_properties(properties: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in properties {
        out.push_str(&escape_property(key, true));
        out.push('=');
        out.push_str(&escape_property(value, false));
        out.push('\n');
    }
    out
}

fn escape_property(text: &str, is_key: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '=' | ':' | ' ' if is_key => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
