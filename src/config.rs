//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How paths are rendered back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// Root-relative key, forward-slash separated
    #[default]
    Relative,
    /// Search root joined with the key
    Absolute,
}

/// Configuration for a search engine over one root directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory tree being searched
    pub root: PathBuf,
    /// Output path rendering
    #[serde(default)]
    pub path_mode: PathMode,
    /// Results returned per `search` call
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Files larger than this are not indexed
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Directory names pruned from every walk
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    /// Index dot-files and dot-directories
    #[serde(default)]
    pub include_hidden: bool,
    /// Honor .gitignore / .ignore files
    #[serde(default = "default_true")]
    pub respect_ignore_files: bool,
    /// Characters of context before a chunk offset
    #[serde(default = "default_chunk_before")]
    pub chunk_before: usize,
    /// Characters of context from a chunk offset onwards
    #[serde(default = "default_chunk_after")]
    pub chunk_after: usize,
    /// Where the snapshot is persisted; `None` keeps the index in memory only
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
}

fn default_page_size() -> usize {
    5
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_ignored_dirs() -> Vec<String> {
    [".git", "node_modules", "target", "__pycache__", ".venv", "venv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_chunk_before() -> usize {
    100
}

fn default_chunk_after() -> usize {
    900
}

impl EngineConfig {
    /// In-memory configuration with defaults for the given root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path_mode: PathMode::default(),
            page_size: default_page_size(),
            max_file_size: default_max_file_size(),
            ignored_dirs: default_ignored_dirs(),
            include_hidden: false,
            respect_ignore_files: true,
            chunk_before: default_chunk_before(),
            chunk_after: default_chunk_after(),
            index_dir: None,
        }
    }

    pub fn with_path_mode(mut self, mode: PathMode) -> Self {
        self.path_mode = mode;
        self
    }

    pub fn with_index_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.index_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/data");
        assert_eq!(config.path_mode, PathMode::Relative);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.chunk_before, 100);
        assert_eq!(config.chunk_after, 900);
        assert!(config.ignored_dirs.iter().any(|d| d == ".git"));
        assert!(config.index_dir.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"root": "/data", "path_mode": "absolute"}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.path_mode, PathMode::Absolute);
        assert_eq!(config.page_size, 5);
        assert!(config.respect_ignore_files);
    }
}
