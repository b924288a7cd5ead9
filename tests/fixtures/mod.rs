//! Shared helpers for integration tests

#![allow(dead_code)]

use findex::{EngineConfig, SearchEngine};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary tree from `(relative path, content)` pairs
pub fn create_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (path, content) in files {
        write_file(dir.path(), path, content.as_bytes());
    }
    dir
}

pub fn write_file(root: &Path, path: &str, content: &[u8]) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(full, content).expect("Failed to write file");
}

/// In-memory engine over `root`, already indexed
pub fn indexed_engine(root: &Path) -> SearchEngine {
    let engine = SearchEngine::open(EngineConfig::new(root)).expect("Failed to open engine");
    engine.refresh().expect("Failed to index");
    engine
}

/// Rendered paths of the first page of results
pub fn hit_paths(engine: &SearchEngine, query: &str) -> Vec<String> {
    engine
        .search(query, None, 0)
        .expect("search failed")
        .hits
        .into_iter()
        .map(|h| h.path)
        .collect()
}

/// Bump a file's mtime far enough that fingerprints always differ
pub fn rewrite(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::write(&full, content).expect("Failed to rewrite file");
    let file = fs::File::options().write(true).open(&full).expect("Failed to open file");
    let later = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    file.set_modified(later).expect("Failed to set mtime");
}
