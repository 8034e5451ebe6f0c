//! Configuration management for deploygate
//!
//! Process-level settings are loaded from environment variables with sensible
//! defaults. Project-level settings (resolver and deployer repositories,
//! Gradle toggles) live in the project configuration file, see
//! [`crate::build::project`].
//!
//! # Environment Variables
//!
//! - `DEPLOYGATE_PROJECT_CONFIG`: project configuration file - default: ".deploygate/gradle.yaml"
//! - `DEPLOYGATE_SERVER_URL`: artifact repository base URL
//! - `DEPLOYGATE_USER` / `DEPLOYGATE_PASSWORD`: basic credentials
//! - `DEPLOYGATE_ACCESS_TOKEN`: access token, preferred over the password
//! - `DEPLOYGATE_SCANNER_COMMAND`: scanner program - default: "jf"
//! - `DEPLOYGATE_SCANNER_ARGS`: leading scanner arguments - default: "scan"
//! - `DEPLOYGATE_UPLOAD_TIMEOUT`: upload request timeout in seconds - default: "300"
//! - `DEPLOYGATE_PROPERTIES_ENV`: variable carrying the build properties file - default: "BUILDINFO_PROPFILE"
//! - `DEPLOYGATE_EXTRACTOR_INIT_SCRIPT`: init script applied when the build does not use the plugin
//! - `DEPLOYGATE_LOG_LEVEL`: logging level - default: "info"
//! - `GRADLE_USER_HOME`: Gradle user home - default: "~/.gradle"
//!
//! # Example
//!
//! ```no_run
//! use deploygate::DeploygateConfig;
//!
//! let config = DeploygateConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::build::executor::ExecutorSettings;
use crate::scan::ScannerSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROJECT_CONFIG: &str = ".deploygate/gradle.yaml";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PROPERTIES_ENV: &str = "BUILDINFO_PROPFILE";
const MAX_UPLOAD_TIMEOUT_SECS: u64 = 3600;

/// Environment configuration errors
#[derive(Debug, Error)]
pub enum EnvConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Credentials and location of the artifact repository
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerDetails {
    pub url: Option<String>,
    pub user: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl ServerDetails {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some() || self.user.is_some()
    }
}

// Secrets never reach logs
impl fmt::Debug for ServerDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerDetails")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Main configuration structure for deploygate
#[derive(Debug, Clone)]
pub struct DeploygateConfig {
    /// Project configuration file
    pub project_config: PathBuf,

    /// Artifact repository server
    pub server: ServerDetails,

    /// External scanner invocation
    pub scanner: ScannerSettings,

    /// Upload request timeout in seconds
    pub upload_timeout_secs: u64,

    /// Variable the build reads its properties file path from
    pub properties_env: String,

    /// Init script applied when the build does not use the plugin
    pub extractor_init_script: Option<PathBuf>,

    /// Gradle user home, where init scripts are written
    pub gradle_user_home: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for DeploygateConfig {
    /// Loads configuration from `DEPLOYGATE_*` environment variables
    fn default() -> Self {
        let project_config = non_empty_var("DEPLOYGATE_PROJECT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECT_CONFIG));

        let server = ServerDetails {
            url: non_empty_var("DEPLOYGATE_SERVER_URL"),
            user: non_empty_var("DEPLOYGATE_USER"),
            password: non_empty_var("DEPLOYGATE_PASSWORD"),
            access_token: non_empty_var("DEPLOYGATE_ACCESS_TOKEN"),
        };

        let mut scanner = ScannerSettings::default();
        if let Some(program) = non_empty_var("DEPLOYGATE_SCANNER_COMMAND") {
            scanner.program = program;
        }
        if let Ok(args) = env::var("DEPLOYGATE_SCANNER_ARGS") {
            scanner.args = args.split_whitespace().map(str::to_string).collect();
        }

        let upload_timeout_secs = env::var("DEPLOYGATE_UPLOAD_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS);

        let properties_env = non_empty_var("DEPLOYGATE_PROPERTIES_ENV")
            .unwrap_or_else(|| DEFAULT_PROPERTIES_ENV.to_string());

        let extractor_init_script = non_empty_var("DEPLOYGATE_EXTRACTOR_INIT_SCRIPT").map(PathBuf::from);

        let gradle_user_home = non_empty_var("GRADLE_USER_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".gradle")));

        let log_level = env::var("DEPLOYGATE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            project_config,
            server,
            scanner,
            upload_timeout_secs,
            properties_env,
            extractor_init_script,
            gradle_user_home,
            log_level,
        }
    }
}

impl DeploygateConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `EnvConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), EnvConfigError> {
        if self.upload_timeout_secs == 0 {
            return Err(EnvConfigError::ValidationFailed(
                "Upload timeout must be at least 1 second".to_string(),
            ));
        }
        if self.upload_timeout_secs > MAX_UPLOAD_TIMEOUT_SECS {
            return Err(EnvConfigError::ValidationFailed(
                "Upload timeout cannot exceed 1 hour".to_string(),
            ));
        }

        if self.scanner.program.trim().is_empty() {
            return Err(EnvConfigError::ValidationFailed(
                "Scanner command cannot be empty".to_string(),
            ));
        }

        if let Some(url) = &self.server.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(EnvConfigError::ValidationFailed(format!(
                    "Server URL must start with http:// or https://: {}",
                    url
                )));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(EnvConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            properties_env: self.properties_env.clone(),
            extractor_init_script: self.extractor_init_script.clone(),
        }
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "project_config".to_string(),
            self.project_config.display().to_string(),
        );
        if let Some(url) = &self.server.url {
            map.insert("server_url".to_string(), url.clone());
        }
        if let Some(user) = &self.server.user {
            map.insert("user".to_string(), user.clone());
        }
        map.insert(
            "access_token".to_string(),
            if self.server.access_token.is_some() { "set" } else { "unset" }.to_string(),
        );
        map.insert(
            "scanner".to_string(),
            format!("{} {}", self.scanner.program, self.scanner.args.join(" "))
                .trim()
                .to_string(),
        );
        map.insert(
            "upload_timeout_secs".to_string(),
            self.upload_timeout_secs.to_string(),
        );
        map.insert("properties_env".to_string(), self.properties_env.clone());
        if let Some(home) = &self.gradle_user_home {
            map.insert("gradle_user_home".to_string(), home.display().to_string());
        }
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for DeploygateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deploygate Configuration:")?;
        writeln!(f, "  Project Config: {}", self.project_config.display())?;
        writeln!(
            f,
            "  Server URL: {}",
            self.server.url.as_deref().unwrap_or("(unset)")
        )?;
        writeln!(
            f,
            "  Credentials: {}",
            if self.server.has_credentials() { "set" } else { "unset" }
        )?;
        writeln!(
            f,
            "  Scanner: {} {}",
            self.scanner.program,
            self.scanner.args.join(" ")
        )?;
        writeln!(f, "  Upload Timeout: {}s", self.upload_timeout_secs)?;
        writeln!(f, "  Properties Env: {}", self.properties_env)?;
        if let Some(home) = &self.gradle_user_home {
            writeln!(f, "  Gradle User Home: {}", home.display())?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
