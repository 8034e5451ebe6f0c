//! File selections
//!
//! A selection names the files one upload call handles, in the shape of an
//! upload spec: `{"files": [{"pattern": "...", "target": "..."}]}`.

use crate::manifest::{ArtifactClass, BuildManifest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    /// Local file to upload
    pub pattern: String,
    /// Destination, `<repository>/<path>`
    pub target: String,
}

/// Files designated for one upload operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSelection {
    #[serde(skip)]
    pub class: ArtifactClass,
    pub files: Vec<SelectionEntry>,
}

impl FileSelection {
    pub fn empty(class: ArtifactClass) -> Self {
        Self {
            class,
            files: Vec::new(),
        }
    }

    /// Selection of every artifact of `class`, in manifest order
    pub fn from_manifest(manifest: &BuildManifest, class: ArtifactClass) -> Self {
        let files = manifest
            .of_class(class)
            .map(|record| SelectionEntry {
                pattern: record.local_path.display().to_string(),
                target: record.destination(),
            })
            .collect();

        Self { class, files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Upload spec JSON for this selection
    pub fn to_spec_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Splits a manifest into the binaries and descriptors selections
pub fn partition(manifest: &BuildManifest) -> (FileSelection, FileSelection) {
    (
        FileSelection::from_manifest(manifest, ArtifactClass::Binary),
        FileSelection::from_manifest(manifest, ArtifactClass::Descriptor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ArtifactChecksums, ArtifactRecord};
    use std::path::PathBuf;

    fn record(name: &str) -> ArtifactRecord {
        ArtifactRecord {
            module: "app".to_string(),
            local_path: PathBuf::from(format!("build/{}", name)),
            target_repository: "libs-local".to_string(),
            target_path: format!("com/acme/app/1.0/{}", name),
            class: ArtifactClass::from_file_name(name),
            checksums: ArtifactChecksums::default(),
        }
    }

    #[test]
    fn test_partition_preserves_order() {
        let manifest = BuildManifest::new(vec![
            record("app-1.0.jar"),
            record("app-1.0.pom"),
            record("app-1.0-sources.jar"),
            record("app-1.0.module"),
        ]);

        let (binaries, descriptors) = partition(&manifest);
        assert_eq!(binaries.class, ArtifactClass::Binary);
        assert_eq!(binaries.len(), 2);
        assert_eq!(binaries.files[0].pattern, "build/app-1.0.jar");
        assert_eq!(binaries.files[1].pattern, "build/app-1.0-sources.jar");
        assert_eq!(descriptors.len(), 2);
        assert_eq!(
            descriptors.files[0].target,
            "libs-local/com/acme/app/1.0/app-1.0.pom"
        );
    }

    #[test]
    fn test_partition_empty_manifest() {
        let (binaries, descriptors) = partition(&BuildManifest::default());
        assert!(binaries.is_empty());
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_spec_json_shape() {
        let manifest = BuildManifest::new(vec![record("app-1.0.jar")]);
        let json = FileSelection::from_manifest(&manifest, ArtifactClass::Binary)
            .to_spec_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["pattern"], "build/app-1.0.jar");
        assert!(value.get("class").is_none());
    }
}
