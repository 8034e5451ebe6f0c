use super::ConfigError;
use serde::Serialize;

/// Build identity attached to uploaded artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: String,
    pub number: String,
    pub project: Option<String>,
}

impl BuildInfo {
    /// Build identity from optional parts
    ///
    /// Returns `None` when neither name nor number is given; giving only one
    /// of them is an error.
    pub fn from_parts(
        name: Option<String>,
        number: Option<String>,
        project: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let name = name.filter(|n| !n.trim().is_empty());
        let number = number.filter(|n| !n.trim().is_empty());

        match (name, number) {
            (None, None) => Ok(None),
            (Some(name), Some(number)) => Ok(Some(Self {
                name,
                number,
                project: project.filter(|p| !p.trim().is_empty()),
            })),
            (Some(_), None) => Err(ConfigError::InvalidBuildInfo(
                "build name given without a build number".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::InvalidBuildInfo(
                "build number given without a build name".to_string(),
            )),
        }
    }
}
