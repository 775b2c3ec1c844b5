//! Deployment preferences stored per project.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

const PREFS_DIR: &str = ".wharf";
const PREFS_FILE: &str = ".wharf/deploy.json";
const DEFAULT_DEPLOY_DIR: &str = ".wharf/deploy";

/// A module the project wants deployed, by name and source directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Project-level deployment preferences stored in `.wharf/deploy.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentPreferences {
    /// Publish method type id; `None` selects the built-in local method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Deploy directory; relative paths resolve against the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_dir: Option<PathBuf>,
    /// Modules to deploy.
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

impl DeploymentPreferences {
    /// Location of the preferences file for a project directory.
    pub fn path(project_path: &Path) -> PathBuf {
        project_path.join(PREFS_FILE)
    }

    /// Read preferences from a project directory.
    ///
    /// Missing or unparseable files yield defaults, so a misconfigured
    /// project still publishes with the local method.
    pub async fn read(project_path: &Path) -> Self {
        let prefs_path = project_path.join(PREFS_FILE);

        if !prefs_path.exists() {
            debug!(path = %prefs_path.display(), "Preferences file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&prefs_path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prefs) => {
                    debug!(path = %prefs_path.display(), "Preferences loaded successfully");
                    prefs
                }
                Err(e) => {
                    warn!(path = %prefs_path.display(), error = %e, "Failed to parse preferences, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %prefs_path.display(), error = %e, "Failed to read preferences file, using defaults");
                Self::default()
            }
        }
    }

    /// Write preferences to a project directory.
    pub async fn write(&self, project_path: &Path) -> std::io::Result<()> {
        let prefs_dir = project_path.join(PREFS_DIR);
        let prefs_path = project_path.join(PREFS_FILE);

        if !prefs_dir.exists() {
            fs::create_dir_all(&prefs_dir).await?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&prefs_path, content).await?;
        debug!(path = %prefs_path.display(), "Preferences saved successfully");

        Ok(())
    }

    /// Resolve the deploy root against the project directory.
    pub fn deploy_root(&self, project_path: &Path) -> PathBuf {
        match &self.deploy_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project_path.join(dir),
            None => project_path.join(DEFAULT_DEPLOY_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prefs_default() {
        let prefs = DeploymentPreferences::default();
        assert!(prefs.method.is_none());
        assert!(prefs.deploy_dir.is_none());
        assert!(prefs.modules.is_empty());
    }

    #[tokio::test]
    async fn test_prefs_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = DeploymentPreferences::read(temp_dir.path()).await;
        assert!(prefs.method.is_none());
    }

    #[tokio::test]
    async fn test_prefs_read_corrupt_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(PREFS_DIR))
            .await
            .unwrap();
        fs::write(temp_dir.path().join(PREFS_FILE), "{not json")
            .await
            .unwrap();

        let prefs = DeploymentPreferences::read(temp_dir.path()).await;
        assert!(prefs.method.is_none());
    }

    #[tokio::test]
    async fn test_prefs_write_and_read() {
        let temp_dir = TempDir::new().unwrap();

        let prefs = DeploymentPreferences {
            method: Some("local".to_string()),
            deploy_dir: Some(PathBuf::from("deployments")),
            modules: vec![ModuleEntry {
                name: "webapp".to_string(),
                path: PathBuf::from("webapp"),
            }],
        };

        prefs.write(temp_dir.path()).await.unwrap();

        let loaded = DeploymentPreferences::read(temp_dir.path()).await;
        assert_eq!(loaded.method.as_deref(), Some("local"));
        assert_eq!(loaded.modules.len(), 1);
        assert_eq!(loaded.modules[0].name, "webapp");
    }

    #[test]
    fn test_deploy_root_resolution() {
        let project = Path::new("/srv/project");

        let prefs = DeploymentPreferences::default();
        assert_eq!(
            prefs.deploy_root(project),
            PathBuf::from("/srv/project/.wharf/deploy")
        );

        let prefs = DeploymentPreferences {
            deploy_dir: Some(PathBuf::from("out")),
            ..Default::default()
        };
        assert_eq!(prefs.deploy_root(project), PathBuf::from("/srv/project/out"));

        let prefs = DeploymentPreferences {
            deploy_dir: Some(PathBuf::from("/var/deploy")),
            ..Default::default()
        };
        assert_eq!(prefs.deploy_root(project), PathBuf::from("/var/deploy"));
    }
}
