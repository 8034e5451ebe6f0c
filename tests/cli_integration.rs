//! CLI integration tests
//!
//! These run the built binary and check exit codes and output:
//! - 0 when the run succeeds, deployed or not
//! - 1 when the run fails
//! - 2 for configuration errors

use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const PROJECT_WITH_DEPLOYER: &str = "\
resolver:
  repo: libs-release
deployer:
  repo: libs-release-local
useWrapper: true
";

/// Command for the binary with a clean DEPLOYGATE_* environment
fn deploygate(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_deploygate"));
    cmd.current_dir(dir);
    for (key, _) in std::env::vars() {
        if key.starts_with("DEPLOYGATE_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG");
    cmd.env("GRADLE_USER_HOME", dir.join("gradle-home"));
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute deploygate")
}

fn write_project(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("gradle.yaml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path()).arg("--help"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("deploygate"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("init-script"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path()).arg("--version"));

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("deploygate"));
}

#[test]
fn test_build_help_lists_scan_flags() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path()).args(["build", "--help"]));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--scan"));
    assert!(stdout.contains("--detailed-summary"));
    assert!(stdout.contains("--threads"));
}

#[test]
fn test_missing_project_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path()).args(["build", "--config", "nope.yaml", "build"]));

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_scan_without_deployer_is_config_error() {
    let dir = TempDir::new().unwrap();
    let project = write_project(&dir, "resolver:\n  repo: libs-release\n");

    let output = run(deploygate(dir.path())
        .env("DEPLOYGATE_SERVER_URL", "http://127.0.0.1:9")
        .args(["build", "--scan", "--config"])
        .arg(&project));

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("deployer"));
}

#[test]
fn test_missing_wrapper_is_run_failure() {
    let dir = TempDir::new().unwrap();
    let project = write_project(&dir, PROJECT_WITH_DEPLOYER);

    let output = run(deploygate(dir.path())
        .args(["build", "publish", "--config"])
        .arg(&project));

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_environment_is_config_error() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path())
        .env("DEPLOYGATE_UPLOAD_TIMEOUT", "0")
        .arg("config"));

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_json() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path())
        .env("DEPLOYGATE_SERVER_URL", "https://repo.example.com/artifactory")
        .env("DEPLOYGATE_ACCESS_TOKEN", "secret-token")
        .args(["config", "--format", "json"]));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["server_url"], "https://repo.example.com/artifactory");
    assert_eq!(value["access_token"], "set");
    assert!(!stdout.contains("secret-token"));
}

#[test]
fn test_init_script_written_to_gradle_home() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path())
        .env("DEPLOYGATE_SERVER_URL", "https://repo.example.com/artifactory/")
        .env("DEPLOYGATE_ACCESS_TOKEN", "secret-token")
        .args(["init-script", "--repo", "libs-release"]));

    assert!(output.status.success());
    let script_path = dir
        .path()
        .join("gradle-home")
        .join("init.d")
        .join("deploygate.init.gradle");
    let script = fs::read_to_string(script_path).unwrap();
    assert!(script.contains("https://repo.example.com/artifactory"));
    assert!(script.contains("api/gradle/libs-release"));
    assert!(script.contains("secret-token"));
}

#[test]
fn test_init_script_without_server_is_config_error() {
    let dir = TempDir::new().unwrap();
    let output = run(deploygate(dir.path()).args(["init-script", "--repo", "libs-release"]));

    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
mod scripted {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_executable(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// A wrapper that lists one jar and one pom in the artifact-details file
    fn fake_gradlew(dir: &TempDir) {
        write_executable(
            &dir.path().join("gradlew"),
            r#"#!/bin/sh
file=$(grep '^buildInfoConfig.deployableArtifactsFile=' "$BUILDINFO_PROPFILE" | cut -d= -f2-)
if [ -n "$file" ]; then
  printf '%s' '{"app":[{"sourcePath":"build/libs/app.jar","artifactDest":"com/example/app/1.0/app.jar"},{"sourcePath":"build/app.pom","artifactDest":"com/example/app/1.0/app.pom"}]}' > "$file"
fi
"#,
        );
    }

    #[test]
    #[serial]
    fn test_rejected_scan_deploys_nothing() {
        let dir = TempDir::new().unwrap();
        let project = write_project(&dir, PROJECT_WITH_DEPLOYER);
        fake_gradlew(&dir);
        let scanner = dir.path().join("scanner");
        write_executable(
            &scanner,
            "#!/bin/sh\necho '{\"violations\":1}'\necho 'CVE-2024-0001 critical' >&2\nexit 3\n",
        );

        let output = run(deploygate(dir.path())
            .env("DEPLOYGATE_SERVER_URL", "http://127.0.0.1:9")
            .env("DEPLOYGATE_SCANNER_COMMAND", &scanner)
            .env("DEPLOYGATE_SCANNER_ARGS", "")
            .args(["build", "publish", "--scan", "--detailed-summary", "--config"])
            .arg(&project));

        assert_eq!(output.status.code(), Some(0));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Build succeeded, nothing deployed"));
        assert!(stdout.contains("CVE-2024-0001"));
        assert!(stdout.contains("{\"violations\":1}"));
    }

    #[test]
    #[serial]
    fn test_scanner_crash_is_run_failure() {
        let dir = TempDir::new().unwrap();
        let project = write_project(&dir, PROJECT_WITH_DEPLOYER);
        fake_gradlew(&dir);
        let scanner = dir.path().join("scanner");
        write_executable(&scanner, "#!/bin/sh\necho 'engine exploded' >&2\nexit 2\n");

        let output = run(deploygate(dir.path())
            .env("DEPLOYGATE_SERVER_URL", "http://127.0.0.1:9")
            .env("DEPLOYGATE_SCANNER_COMMAND", &scanner)
            .env("DEPLOYGATE_SCANNER_ARGS", "")
            .args(["build", "publish", "--scan", "--config"])
            .arg(&project));

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("engine exploded"));
    }

    #[test]
    #[serial]
    fn test_scanner_crash_still_prints_detailed_summary() {
        let dir = TempDir::new().unwrap();
        let project = write_project(&dir, PROJECT_WITH_DEPLOYER);
        fake_gradlew(&dir);
        let scanner = dir.path().join("scanner");
        write_executable(
            &scanner,
            "#!/bin/sh\necho '{\"partial\":true}'\necho 'engine exploded' >&2\nexit 2\n",
        );

        let output = run(deploygate(dir.path())
            .env("DEPLOYGATE_SERVER_URL", "http://127.0.0.1:9")
            .env("DEPLOYGATE_SCANNER_COMMAND", &scanner)
            .env("DEPLOYGATE_SCANNER_ARGS", "")
            .args(["build", "publish", "--scan", "--detailed-summary", "--config"])
            .arg(&project));

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stdout).contains("{\"partial\":true}"));
    }

    #[test]
    #[serial]
    fn test_plain_build_skips_scan() {
        let dir = TempDir::new().unwrap();
        let project = write_project(&dir, PROJECT_WITH_DEPLOYER);
        fake_gradlew(&dir);

        let output = run(deploygate(dir.path())
            .args(["build", "publish", "--format", "json", "--config"])
            .arg(&project));

        assert_eq!(output.status.code(), Some(0));
        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("JSON report on stdout");
        assert_eq!(value["stage"], "scan_skipped");
        assert_eq!(value["outcome"], "nothing_deployed");
    }
}
