//! Artifact manifest reader
//!
//! The build writes a JSON file listing every artifact it produced, keyed by
//! module name. This module turns that file into a [`BuildManifest`]: a flat,
//! ordered list of [`ArtifactRecord`]s, each classified as either a primary
//! binary or an auxiliary descriptor (POMs, Gradle module metadata, Ivy files).
//!
//! # File format
//!
//! ```json
//! {
//!   "app": [
//!     { "sourcePath": "build/libs/app-1.0.jar", "artifactDest": "com/acme/app/1.0/app-1.0.jar",
//!       "targetRepository": "libs-release-local", "sha1": "..." }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading the artifact-details file
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The file the build was supposed to write does not exist
    #[error("Artifact details file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read artifact details file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a valid artifact-details document
    #[error("Malformed artifact details file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record is missing a field the pipeline cannot do without
    #[error("Artifact record in module '{module}' has an empty {field}")]
    EmptyField { module: String, field: &'static str },
}

/// Artifact class, used to split uploads into two ordered phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactClass {
    /// Primary build output (jars, wars, archives)
    Binary,
    /// Descriptor files that reference binary coordinates
    Descriptor,
}

impl ArtifactClass {
    /// Classifies an artifact by its file name
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let is_descriptor = lower.ends_with(".pom")
            || lower == "pom.xml"
            || lower.ends_with(".module")
            || lower == "ivy.xml"
            || (lower.starts_with("ivy-") && lower.ends_with(".xml"));

        if is_descriptor {
            ArtifactClass::Descriptor
        } else {
            ArtifactClass::Binary
        }
    }
}

impl fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactClass::Binary => write!(f, "binaries"),
            ArtifactClass::Descriptor => write!(f, "descriptors"),
        }
    }
}

/// Checksums reported by the build for one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactChecksums {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// One artifact produced by the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Module that produced the artifact
    pub module: String,
    /// Path of the file on the local disk
    pub local_path: PathBuf,
    /// Repository the artifact is deployed to
    pub target_repository: String,
    /// Path inside the target repository
    pub target_path: String,
    pub class: ArtifactClass,
    pub checksums: ArtifactChecksums,
}

impl ArtifactRecord {
    /// Full destination, `<repository>/<path>`
    pub fn destination(&self) -> String {
        format!(
            "{}/{}",
            self.target_repository.trim_end_matches('/'),
            self.target_path.trim_start_matches('/')
        )
    }
}

/// Ordered list of artifacts produced during one build run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildManifest {
    records: Vec<ArtifactRecord>,
}

impl BuildManifest {
    pub fn new(records: Vec<ArtifactRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ArtifactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of a single class, in manifest order
    pub fn of_class(&self, class: ArtifactClass) -> impl Iterator<Item = &ArtifactRecord> {
        self.records.iter().filter(move |r| r.class == class)
    }

    pub fn count(&self, class: ArtifactClass) -> usize {
        self.of_class(class).count()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    source_path: String,
    artifact_dest: String,
    #[serde(default)]
    target_repository: Option<String>,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

/// Parses artifact-details files
#[derive(Debug, Clone, Default)]
pub struct ManifestReader {
    default_repository: Option<String>,
}

impl ManifestReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository used for records that do not name one
    pub fn with_default_repository(mut self, repository: impl Into<String>) -> Self {
        self.default_repository = Some(repository.into());
        self
    }

    /// Reads and parses the artifact-details file at `path`
    pub fn read(&self, path: &Path) -> Result<BuildManifest, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound(path.to_path_buf())
            } else {
                ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let manifest = self.parse(&content).map_err(|err| match err {
            ParseFailure::Json(source) => ManifestError::Malformed {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Field(err) => err,
        })?;

        debug!(
            path = %path.display(),
            artifacts = manifest.len(),
            "Parsed artifact details file"
        );
        Ok(manifest)
    }

    fn parse(&self, content: &str) -> Result<BuildManifest, ParseFailure> {
        // The build creates the file up front, so an untouched file is empty
        if content.trim().is_empty() {
            return Ok(BuildManifest::default());
        }

        let modules: BTreeMap<String, Vec<RawArtifact>> =
            serde_json::from_str(content).map_err(ParseFailure::Json)?;

        let mut records = Vec::new();
        for (module, artifacts) in modules {
            for raw in artifacts {
                records.push(self.to_record(&module, raw)?);
            }
        }

        Ok(BuildManifest::new(records))
    }

    fn to_record(&self, module: &str, raw: RawArtifact) -> Result<ArtifactRecord, ParseFailure> {
        if raw.source_path.trim().is_empty() {
            return Err(ParseFailure::Field(ManifestError::EmptyField {
                module: module.to_string(),
                field: "sourcePath",
            }));
        }
        if raw.artifact_dest.trim().is_empty() {
            return Err(ParseFailure::Field(ManifestError::EmptyField {
                module: module.to_string(),
                field: "artifactDest",
            }));
        }

        let target_repository = raw
            .target_repository
            .filter(|r| !r.trim().is_empty())
            .or_else(|| {
                self.default_repository
                    .clone()
                    .filter(|r| !r.trim().is_empty())
            })
            .ok_or_else(|| {
                ParseFailure::Field(ManifestError::EmptyField {
                    module: module.to_string(),
                    field: "targetRepository",
                })
            })?;

        let file_name = raw
            .artifact_dest
            .rsplit('/')
            .next()
            .unwrap_or(raw.artifact_dest.as_str());

        Ok(ArtifactRecord {
            module: module.to_string(),
            class: ArtifactClass::from_file_name(file_name),
            local_path: PathBuf::from(raw.source_path),
            target_repository,
            target_path: raw.artifact_dest,
            checksums: ArtifactChecksums {
                sha1: raw.sha1,
                sha256: raw.sha256,
            },
        })
    }
}

enum ParseFailure {
    Json(serde_json::Error),
    Field(ManifestError),
}
