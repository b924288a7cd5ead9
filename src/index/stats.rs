use crate::index::snapshot::IndexSnapshot;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Point-in-time summary of a search root and its index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub root_path: PathBuf,
    pub version: u64,
    pub doc_count: usize,
    pub term_count: usize,
    pub occurrence_count: usize,
    /// Total size of the indexed source files
    pub source_bytes: u64,
    /// `None` when the index is kept in memory only
    pub index_dir: Option<PathBuf>,
    pub index_bytes: Option<u64>,
}

impl IndexStats {
    pub fn collect(root: &Path, snapshot: &IndexSnapshot, index_dir: Option<&Path>) -> Self {
        Self {
            root_path: root.to_path_buf(),
            version: snapshot.version(),
            doc_count: snapshot.doc_count(),
            term_count: snapshot.term_count(),
            occurrence_count: snapshot.occurrence_count(),
            source_bytes: snapshot.documents().map(|d| d.fingerprint.size).sum(),
            index_dir: index_dir.map(Path::to_path_buf),
            index_bytes: index_dir.and_then(|dir| dir_size(dir).ok()),
        }
    }
}

/// Calculate directory size recursively
pub fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(10), "10 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_collect_in_memory() {
        let stats = IndexStats::collect(Path::new("/r"), &IndexSnapshot::empty(), None);
        assert_eq!(stats.version, 0);
        assert_eq!(stats.doc_count, 0);
        assert!(stats.index_bytes.is_none());
    }

    #[test]
    fn test_dir_size_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a"), [0u8; 5]).unwrap();
        std::fs::write(dir.path().join("sub/b"), [0u8; 7]).unwrap();
        assert_eq!(dir_size(dir.path()).unwrap(), 12);
    }
}
