//! Immediate children of a directory under the search root.

use crate::error::{SearchError, SearchResult};
use crate::utils::PathResolver;
use serde::Serialize;
use std::fs;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size for files, `None` for directories
    pub size: Option<u64>,
}

impl DirEntryInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

pub struct DirectoryLister {
    resolver: PathResolver,
}

impl DirectoryLister {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// List `input` (a key, root-relative path, or `""` for the root).
    ///
    /// Directories come first, then files, each group ordered by name
    /// ignoring case.
    pub fn list(&self, input: &str) -> SearchResult<Vec<DirEntryInfo>> {
        let key = self.resolver.resolve(input)?;
        let path = self.resolver.locate(&key);
        let shown = if input.is_empty() { "/" } else { input };

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SearchError::NotFound(shown.to_string()));
            }
            Err(e) => return Err(SearchError::io(&path, e)),
        };
        if !meta.is_dir() {
            return Err(SearchError::NotADirectory(shown.to_string()));
        }
        self.resolver.ensure_contained(input, &path)?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| SearchError::io(&path, e))? {
            let entry = entry.map_err(|e| SearchError::io(&path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            // Follow symlinks so a linked directory lists as a directory
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(name = %name, error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            entries.push(if meta.is_dir() {
                DirEntryInfo {
                    name,
                    kind: EntryKind::Dir,
                    size: None,
                }
            } else {
                DirEntryInfo {
                    name,
                    kind: EntryKind::File,
                    size: Some(meta.len()),
                }
            });
        }

        entries.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }
}
