//! Output formatting for run reports and configuration
//!
//! ```ignore
//! use deploygate::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! println!("{}", formatter.format_outcome(&outcome.report())?);
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::config::DeploygateConfig;
use crate::pipeline::{OutcomeKind, OutcomeReport, PipelineStage};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats the report of a run that did not fail
    pub fn format_outcome(&self, report: &OutcomeReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize run report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize run report to YAML")
            }
            OutputFormat::Human => Ok(self.format_outcome_human(report)),
        }
    }

    /// Formats the effective configuration
    pub fn format_config(&self, config: &DeploygateConfig) -> Result<String> {
        // Sorted so the output is stable between runs
        let map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&map).context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_outcome_human(&self, report: &OutcomeReport) -> String {
        let mut output = String::new();

        match report.outcome {
            OutcomeKind::Deployed => {
                let files: usize = report.uploads.iter().map(|u| u.files).sum();
                output.push_str(&format!("\u{2713} Deployed {} file(s)\n", files));
            }
            OutcomeKind::NothingDeployed => {
                output.push_str("\u{2713} Build succeeded, nothing deployed\n");
            }
        }

        let reason = match report.stage {
            PipelineStage::ScanSkipped => Some("scan not performed"),
            PipelineStage::ScanFailed => Some("scan did not pass"),
            PipelineStage::Done if report.uploads.is_empty() => Some("no artifacts to upload"),
            _ => None,
        };
        if let Some(reason) = reason {
            output.push_str(&format!("  Reason: {}\n", reason));
        }

        output.push_str(&format!("  Artifacts: {}\n", report.artifacts));
        for upload in &report.uploads {
            output.push_str(&format!(
                "  \u{251C}\u{2500} {}: {} file(s), {} bytes\n",
                upload.class, upload.files, upload.bytes
            ));
        }

        if !report.violations.is_empty() {
            output.push_str("\n\u{26A0} Violations:\n");
            for violation in &report.violations {
                output.push_str(&format!("  - {}\n", violation));
            }
        }

        output.push_str(&format!("\nFinished in {}ms\n", report.duration_ms));
        output
    }
}
