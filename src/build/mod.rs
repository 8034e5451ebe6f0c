//! Build-side configuration and execution
//!
//! - [`project`]: the project configuration file
//! - [`resolver`]: derives build properties and the deploy-disabled decision
//! - [`executor`]: runs the build tool
//! - [`info`]: build identity attached to uploads
//! - [`init_script`]: writes the Gradle init script used for resolution

pub mod error;
pub mod executor;
pub mod info;
pub mod init_script;
pub mod project;
pub mod resolver;

pub use error::{BuildError, ConfigError};
pub use executor::{BuildExecutor, BuildInvocation, ExecutorSettings, GradleExecutor};
pub use info::BuildInfo;
pub use project::ProjectConfig;
pub use resolver::{deployment_disabled, resolve, should_create_artifacts_file, ResolvedBuild};
