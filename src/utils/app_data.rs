use crate::config::{EngineConfig, PathMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "findex";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default output path rendering
    #[serde(default)]
    pub path_mode: PathMode,

    /// Results per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Index dot-files and dot-directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Honor .gitignore / .ignore files while walking
    #[serde(default = "default_respect_ignore_files")]
    pub respect_ignore_files: bool,

    /// Persist snapshots between runs
    #[serde(default = "default_persist_index")]
    pub persist_index: bool,

    /// Replaces the built-in list of pruned directory names when set
    #[serde(default)]
    pub ignored_dirs: Option<Vec<String>>,
}

fn default_page_size() -> usize {
    5
}

fn default_respect_ignore_files() -> bool {
    true
}

fn default_persist_index() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            path_mode: PathMode::default(),
            page_size: default_page_size(),
            include_hidden: false,
            respect_ignore_files: default_respect_ignore_files(),
            persist_index: default_persist_index(),
            ignored_dirs: None,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Build an engine configuration for `root` from these settings.
    ///
    /// The index directory is only created when both `persist` and the
    /// config file allow persistence.
    pub fn engine_config(&self, root: &Path, persist: bool) -> Result<EngineConfig> {
        let mut config = EngineConfig::new(root)
            .with_path_mode(self.path_mode)
            .with_page_size(self.page_size);
        config.include_hidden = self.include_hidden;
        config.respect_ignore_files = self.respect_ignore_files;
        if let Some(dirs) = &self.ignored_dirs {
            config.ignored_dirs = dirs.clone();
        }
        if persist && self.persist_index {
            config.index_dir = Some(get_index_dir(root)?);
        }
        Ok(config)
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory for storing indexes
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Get the index directory for a specific search root
pub fn get_index_dir(root_path: &Path) -> Result<PathBuf> {
    let app_data = get_app_data_dir()?;
    let indexes_dir = app_data.join("indexes");
    fs::create_dir_all(&indexes_dir)?;

    Ok(indexes_dir.join(hash_path(root_path)))
}

/// Hash a path to create a unique folder name
/// Format: first 16 chars of dir name + hash
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    // Get directory name for readability
    let dir_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("root");

    // Sanitize directory name (remove special chars, truncate)
    let sanitized: String = dir_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    let mut hasher = DefaultHasher::new();
    path_str.hash(&mut hasher);
    let hash = hasher.finish();

    format!("{}-{:016x}", sanitized, hash)
}

/// Remove the persisted index for a search root
pub fn remove_index(root_path: &Path) -> Result<()> {
    let index_dir = get_index_dir(root_path)?;
    if index_dir.exists() {
        fs::remove_dir_all(&index_dir)
            .with_context(|| format!("Failed to remove {}", index_dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_path() {
        let hash1 = hash_path(Path::new("/home/user/project"));
        let hash2 = hash_path(Path::new("/home/user/project"));
        let hash3 = hash_path(Path::new("/home/user/other"));

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert!(hash1.starts_with("project-"));
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 5);
        assert!(config.persist_index);
        assert!(config.ignored_dirs.is_none());
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"path_mode": "absolute", "persist_index": false}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.path_mode, PathMode::Absolute);
        assert!(!config.persist_index);
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_engine_config_without_persistence() {
        let config = AppConfig {
            persist_index: false,
            include_hidden: true,
            ignored_dirs: Some(vec!["build".to_string()]),
            ..AppConfig::default()
        };

        let engine = config.engine_config(Path::new("/data"), true).unwrap();
        assert!(engine.index_dir.is_none());
        assert!(engine.include_hidden);
        assert_eq!(engine.ignored_dirs, vec!["build".to_string()]);
    }

    #[test]
    fn test_engine_config_persist_disabled_by_caller() {
        let engine = AppConfig::default().engine_config(Path::new("/data"), false).unwrap();
        assert!(engine.index_dir.is_none());
    }
}
