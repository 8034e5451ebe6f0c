//! Build configuration resolver
//!
//! Merges the project configuration with the per-invocation settings
//! (thread count, scan request) into the property set handed to the build
//! executor. Deployment is disabled whenever a scan was requested, because
//! uploads then happen only after the scan gate, or when no deployer is
//! configured at all.

use super::project::{ProjectConfig, DEPLOYER_SECTION};
use super::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const USE_WRAPPER: &str = "useWrapper";
pub const USE_PLUGIN: &str = "usePlugin";
pub const FORK_COUNT: &str = "forkCount";
pub const DEPLOY_ARTIFACTS: &str = "deployer.deployArtifacts";
pub const DEPLOYER_URL: &str = "deployer.url";
pub const DEPLOYER_REPO: &str = "deployer.repo";
pub const DEPLOYABLE_ARTIFACTS_FILE: &str = "buildInfoConfig.deployableArtifactsFile";

/// Placeholder values that keep the build's property validation happy when
/// deployment is disabled and the real values are irrelevant
pub const PLACEHOLDER_URL: &str = "http://empty_url";
pub const PLACEHOLDER_REPO: &str = "empty_repo";

/// Properties and toggles derived for one build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    pub properties: BTreeMap<String, String>,
    pub use_wrapper: bool,
    pub use_plugin: bool,
    pub deployment_disabled: bool,
}

impl ResolvedBuild {
    /// Tells the build where to list the artifacts it produced
    pub fn with_artifacts_file(mut self, path: &Path) -> Self {
        self.properties.insert(
            DEPLOYABLE_ARTIFACTS_FILE.to_string(),
            path.display().to_string(),
        );
        self
    }

    /// Repository configured for deployment, ignoring placeholders
    pub fn deploy_repository(&self) -> Option<&str> {
        self.properties
            .get(DEPLOYER_REPO)
            .map(String::as_str)
            .filter(|r| !r.is_empty() && *r != PLACEHOLDER_REPO)
    }
}

/// Whether the build itself must not deploy anything
pub fn deployment_disabled(scan_requested: bool, deployer_configured: bool) -> bool {
    scan_requested || !deployer_configured
}

/// Whether the build must write its artifact-details file
///
/// The file feeds both the scan and the detailed summary of a deploying build.
pub fn should_create_artifacts_file(
    detailed_summary: bool,
    deployment_disabled: bool,
    scan_requested: bool,
) -> bool {
    (detailed_summary && !deployment_disabled) || scan_requested
}

/// Resolves build properties from the project configuration
pub fn resolve(
    raw: &ProjectConfig,
    threads: usize,
    scan_requested: bool,
) -> Result<ResolvedBuild, ConfigError> {
    let deployer_configured = raw.is_set(DEPLOYER_SECTION);
    if scan_requested && !deployer_configured {
        return Err(ConfigError::MissingDeployer {
            section: DEPLOYER_SECTION,
        });
    }

    let use_wrapper = raw.get_bool(USE_WRAPPER);
    let use_plugin = raw.get_bool(USE_PLUGIN);
    let disabled = deployment_disabled(scan_requested, deployer_configured);

    // Overrides go to a working copy; the caller's configuration stays as read
    let mut working = raw.clone();
    if threads > 0 {
        working.set(FORK_COUNT, threads.to_string());
    }

    if disabled {
        working.set(DEPLOY_ARTIFACTS, "false");
        if raw.get_non_empty(DEPLOYER_URL).is_none() {
            working.set(DEPLOYER_URL, PLACEHOLDER_URL);
        }
        if raw.get_non_empty(DEPLOYER_REPO).is_none() {
            working.set(DEPLOYER_REPO, PLACEHOLDER_REPO);
        }
    }
    let properties = working.into_values();

    debug!(
        threads,
        scan_requested,
        deployment_disabled = disabled,
        use_wrapper,
        use_plugin,
        "Resolved build configuration"
    );

    Ok(ResolvedBuild {
        properties,
        use_wrapper,
        use_plugin,
        deployment_disabled: disabled,
    })
}
