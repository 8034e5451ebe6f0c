//! Scanner backed by an external command
//!
//! The manifest is written to a temporary JSON file and passed to the scanner
//! program. Its stdout becomes the report behind the returned
//! [`ResultHandle`]; its exit status is the verdict.

use super::{ScanError, ScanRequest, ScanResponse, ScanVerdict, Scanner};
use crate::pipeline::handle::ResultHandle;
use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Exit code the scanner uses to report policy violations
pub const VIOLATIONS_EXIT_CODE: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    pub program: String,
    /// Leading arguments, placed before the generated ones
    pub args: Vec<String>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            program: "jf".to_string(),
            args: vec!["scan".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandScanner {
    settings: ScannerSettings,
}

impl CommandScanner {
    pub fn new(settings: ScannerSettings) -> Self {
        Self { settings }
    }

    fn arguments(&self, request: &ScanRequest<'_>, manifest_path: &str) -> Vec<String> {
        let mut args = self.settings.args.clone();
        args.push("--manifest".to_string());
        args.push(manifest_path.to_string());
        if request.threads > 0 {
            args.push("--threads".to_string());
            args.push(request.threads.to_string());
        }
        args.push("--format".to_string());
        args.push(request.format.to_string());
        if let Some(url) = request.server.url.as_deref() {
            args.push("--url".to_string());
            args.push(url.to_string());
        }
        args
    }

    fn write_manifest(request: &ScanRequest<'_>) -> Result<NamedTempFile, ScanError> {
        let mut file = tempfile::Builder::new()
            .prefix("scan-manifest")
            .suffix(".json")
            .tempfile()
            .map_err(|e| ScanError::Report(format!("failed to create manifest file: {}", e)))?;
        serde_json::to_writer(&mut file, request.manifest)
            .map_err(|e| ScanError::Report(format!("failed to serialize manifest: {}", e)))?;
        file.flush()
            .map_err(|e| ScanError::Report(format!("failed to write manifest file: {}", e)))?;
        Ok(file)
    }
}

#[async_trait]
impl Scanner for CommandScanner {
    async fn scan(&self, request: ScanRequest<'_>) -> ScanResponse {
        let manifest_file = match Self::write_manifest(&request) {
            Ok(file) => file,
            Err(err) => return ScanResponse::new(Err(err), None),
        };

        let report = match tempfile::Builder::new()
            .prefix("scan-report")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                return ScanResponse::new(
                    Err(ScanError::Report(format!("failed to create report file: {}", e))),
                    None,
                )
            }
        };
        let stdout = match report.reopen() {
            Ok(file) => file,
            Err(e) => {
                return ScanResponse::new(
                    Err(ScanError::Report(format!("failed to open report file: {}", e))),
                    None,
                )
            }
        };

        let args = self.arguments(&request, &manifest_file.path().display().to_string());
        info!(
            program = %self.settings.program,
            artifacts = request.manifest.len(),
            format = %request.format,
            "Scanning build artifacts"
        );
        debug!(args = ?args, "Scanner arguments");

        // `output()` would re-pipe stdout, so spawn and wait to keep the report file attached
        let child = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(source) => {
                return ScanResponse::new(
                    Err(ScanError::Launch {
                        program: self.settings.program.clone(),
                        source,
                    }),
                    None,
                )
            }
        };

        let handle = ResultHandle::from_temp_path(report.into_temp_path());
        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => {
                return ScanResponse::new(
                    Err(ScanError::Report(format!("failed to wait for scanner: {}", e))),
                    Some(handle),
                )
            }
        };
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        let verdict = match output.status.code() {
            Some(0) => Ok(ScanVerdict::passed_for(request.manifest)),
            Some(VIOLATIONS_EXIT_CODE) => {
                let violations: Vec<String> = stderr
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                warn!(violations = violations.len(), "Scan found policy violations");
                Ok(ScanVerdict::Failed { violations })
            }
            code => Err(ScanError::Engine { code, stderr }),
        };

        ScanResponse::new(verdict, Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerDetails;
    use crate::manifest::BuildManifest;
    use crate::pipeline::handle::dispose;
    use crate::scan::ScanOutputFormat;

    fn server() -> ServerDetails {
        ServerDetails {
            url: Some("https://repo.example.com/artifactory".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_arguments() {
        let scanner = CommandScanner::default();
        let manifest = BuildManifest::default();
        let server = server();
        let request = ScanRequest {
            manifest: &manifest,
            server: &server,
            threads: 4,
            format: ScanOutputFormat::Json,
        };

        let args = scanner.arguments(&request, "/tmp/m.json");
        assert_eq!(
            args,
            vec![
                "scan",
                "--manifest",
                "/tmp/m.json",
                "--threads",
                "4",
                "--format",
                "json",
                "--url",
                "https://repo.example.com/artifactory"
            ]
        );
    }

    #[test]
    fn test_arguments_omit_zero_threads() {
        let scanner = CommandScanner::default();
        let manifest = BuildManifest::default();
        let server = ServerDetails::default();
        let request = ScanRequest {
            manifest: &manifest,
            server: &server,
            threads: 0,
            format: ScanOutputFormat::Table,
        };

        let args = scanner.arguments(&request, "m.json");
        assert!(!args.contains(&"--threads".to_string()));
        assert!(!args.contains(&"--url".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let scanner = CommandScanner::new(ScannerSettings {
            program: "deploygate-no-such-scanner".to_string(),
            args: Vec::new(),
        });
        let manifest = BuildManifest::default();
        let server = ServerDetails::default();

        let response = scanner
            .scan(ScanRequest {
                manifest: &manifest,
                server: &server,
                threads: 0,
                format: ScanOutputFormat::Table,
            })
            .await;

        assert!(matches!(response.verdict, Err(ScanError::Launch { .. })));
        assert!(response.handle.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_codes_map_to_verdicts() {
        let manifest = BuildManifest::default();
        let server = ServerDetails::default();

        for (script, expect_passed, expect_error) in [
            ("echo report; exit 0", true, false),
            ("echo 'CVE-1 in app.jar' >&2; exit 3", false, false),
            ("exit 7", false, true),
        ] {
            let scanner = CommandScanner::new(ScannerSettings {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "scanner".to_string()],
            });
            let response = scanner
                .scan(ScanRequest {
                    manifest: &manifest,
                    server: &server,
                    threads: 0,
                    format: ScanOutputFormat::Table,
                })
                .await;

            let handle = response.handle.expect("handle returned");
            match response.verdict {
                Ok(ScanVerdict::Passed { .. }) => assert!(expect_passed, "{}", script),
                Ok(ScanVerdict::Failed { violations }) => {
                    assert!(!expect_passed && !expect_error, "{}", script);
                    assert_eq!(violations, vec!["CVE-1 in app.jar"]);
                }
                Err(ScanError::Engine { code, .. }) => {
                    assert!(expect_error, "{}", script);
                    assert_eq!(code, Some(7));
                }
                Err(other) => panic!("unexpected error: {}", other),
            }

            let mut handed = dispose(handle, true).unwrap().into_handle().unwrap();
            let report = handed.read_to_string().unwrap();
            if expect_passed {
                assert_eq!(report, "report\n");
            }
            handed.close().unwrap();
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_report_keeps_stdout_for_every_verdict() {
        let manifest = BuildManifest::default();
        let server = ServerDetails::default();

        for script in [
            "echo '{\"violations\":0}'; exit 0",
            "echo '{\"violations\":2}'; echo 'CVE-2' >&2; exit 3",
            "echo 'partial'; exit 9",
        ] {
            let scanner = CommandScanner::new(ScannerSettings {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "scanner".to_string()],
            });
            let response = scanner
                .scan(ScanRequest {
                    manifest: &manifest,
                    server: &server,
                    threads: 0,
                    format: ScanOutputFormat::Json,
                })
                .await;

            let handle = response.handle.expect("handle returned");
            let mut handed = dispose(handle, true).unwrap().into_handle().unwrap();
            let report = handed.read_to_string().unwrap();
            assert!(!report.trim().is_empty(), "empty report for {}", script);
            assert!(!report.contains("CVE-2"), "stderr leaked into report");
            handed.close().unwrap();
        }
    }
}
