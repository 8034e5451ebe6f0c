//! Gradle init script generation
//!
//! Writes an init script into `<gradle user home>/init.d/` so every Gradle
//! build on the machine resolves dependencies through the artifact
//! repository. See <https://docs.gradle.org/current/userguide/init_scripts.html>.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default name of the generated script inside `init.d`
pub const INIT_SCRIPT_NAME: &str = "deploygate.init.gradle";

const TEMPLATE: &str = r#"// Generated by deploygate. Changes will be overwritten.
def repositoryUrl = '{{url}}/{{repo_path}}'

def configureRepositories = { handler ->
    handler.maven {
        name = 'deploygate'
        url = repositoryUrl
        credentials {
            username = '{{username}}'
            password = '{{password}}'
        }
    }
}

beforeSettings { settings ->
    settings.pluginManagement.repositories { configureRepositories(delegate) }
}

allprojects { project ->
    project.buildscript.repositories { configureRepositories(delegate) }
    project.repositories { configureRepositories(delegate) }
}
"#;

#[derive(Debug, Error)]
pub enum InitScriptError {
    #[error("Repository URL is required to generate an init script")]
    MissingUrl,

    #[error("Failed to create Gradle init.d directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write Gradle init script to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Values substituted into the init script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitScriptAuth {
    pub repository_url: String,
    pub repository_path: String,
    pub username: String,
    pub password: String,
}

impl InitScriptAuth {
    /// Derives the script values from server credentials
    ///
    /// An access token wins over a password. When only a token is present the
    /// username falls back to `token`.
    pub fn new(
        server_url: &str,
        repo_name: &str,
        user: Option<&str>,
        password: Option<&str>,
        access_token: Option<&str>,
    ) -> Self {
        let mut username = user.unwrap_or_default().to_string();
        let mut secret = password.unwrap_or_default().to_string();

        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            if username.is_empty() {
                username = "token".to_string();
            }
            secret = token.to_string();
        }

        Self {
            repository_url: server_url.trim_end_matches('/').to_string(),
            repository_path: format!("api/gradle/{}", repo_name),
            username,
            password: secret,
        }
    }
}

/// Renders the init script for the given credentials
pub fn generate(auth: &InitScriptAuth) -> Result<String, InitScriptError> {
    if auth.repository_url.is_empty() {
        return Err(InitScriptError::MissingUrl);
    }

    Ok(TEMPLATE
        .replace("{{url}}", &groovy_escape(&auth.repository_url))
        .replace("{{repo_path}}", &groovy_escape(&auth.repository_path))
        .replace("{{username}}", &groovy_escape(&auth.username))
        .replace("{{password}}", &groovy_escape(&auth.password)))
}

/// Writes `script` to `<gradle_user_home>/init.d/<file_name>`
pub fn write(
    gradle_user_home: &Path,
    file_name: &str,
    script: &str,
) -> Result<PathBuf, InitScriptError> {
    let dir = gradle_user_home.join("init.d");
    std::fs::create_dir_all(&dir).map_err(|source| InitScriptError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(file_name);
    std::fs::write(&path, script).map_err(|source| InitScriptError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "Wrote Gradle init script");
    Ok(path)
}

fn groovy_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_wins_over_password() {
        let auth = InitScriptAuth::new(
            "https://repo.example.com/artifactory/",
            "gradle-virtual",
            None,
            Some("secret"),
            Some("tok"),
        );
        assert_eq!(auth.username, "token");
        assert_eq!(auth.password, "tok");
        assert_eq!(auth.repository_url, "https://repo.example.com/artifactory");
        assert_eq!(auth.repository_path, "api/gradle/gradle-virtual");
    }

    #[test]
    fn test_user_kept_with_token() {
        let auth = InitScriptAuth::new("https://h", "r", Some("alice"), None, Some("tok"));
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password, "tok");
    }

    #[test]
    fn test_generate_substitutes_values() {
        let auth = InitScriptAuth::new("https://h/a", "libs", Some("bob"), Some("it's"), None);
        let script = generate(&auth).unwrap();
        assert!(script.contains("def repositoryUrl = 'https://h/a/api/gradle/libs'"));
        assert!(script.contains("username = 'bob'"));
        assert!(script.contains("password = 'it\\'s'"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_generate_requires_url() {
        let auth = InitScriptAuth::new("", "libs", None, None, None);
        assert!(matches!(generate(&auth), Err(InitScriptError::MissingUrl)));
    }

    #[test]
    fn test_write_creates_init_d() {
        let home = TempDir::new().unwrap();
        let path = write(home.path(), INIT_SCRIPT_NAME, "// script").unwrap();
        assert_eq!(path, home.path().join("init.d").join(INIT_SCRIPT_NAME));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "// script");
    }
}
