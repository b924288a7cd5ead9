//! File discovery under the search root.

use crate::config::EngineConfig;
use crate::error::{SearchError, SearchResult};
use crate::index::types::{Fingerprint, WalkedFile};
use crate::utils::PathResolver;
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::fs;
use std::sync::Arc;
use tracing::{debug, warn};

/// Compiled file-name glob.
///
/// `*` stays inside one path segment and `**` crosses segments. A pattern
/// without `/` is matched against the file name alone, so `*.md` selects
/// markdown files at any depth; a pattern with `/` must match the whole key.
#[derive(Debug, Clone)]
pub struct FileFilter {
    pattern: String,
    matcher: GlobMatcher,
    basename_only: bool,
}

impl FileFilter {
    /// Compile `pattern`; an empty pattern or `*` means "no filter"
    pub fn new(pattern: &str) -> SearchResult<Option<Self>> {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern == "*" || pattern == "**" {
            return Ok(None);
        }

        let unified = pattern.replace('\\', "/");
        let glob_source = unified.trim_start_matches('/');
        let glob = GlobBuilder::new(glob_source)
            .literal_separator(true)
            .build()
            .map_err(|e| SearchError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Some(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
            basename_only: !glob_source.contains('/'),
        }))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, key: &str) -> bool {
        if self.basename_only {
            let name = key.rsplit('/').next().unwrap_or(key);
            self.matcher.is_match(name)
        } else {
            self.matcher.is_match(key)
        }
    }
}

/// Enumerates candidate files in key order
pub struct FileWalker {
    resolver: PathResolver,
    ignored_dirs: Arc<Vec<String>>,
    include_hidden: bool,
    respect_ignore_files: bool,
}

impl FileWalker {
    pub fn new(config: &EngineConfig, resolver: PathResolver) -> Self {
        Self {
            resolver,
            ignored_dirs: Arc::new(config.ignored_dirs.clone()),
            include_hidden: config.include_hidden,
            respect_ignore_files: config.respect_ignore_files,
        }
    }

    /// Walk the root, keeping files whose key matches `pattern`
    pub fn walk(&self, pattern: Option<&str>) -> SearchResult<Vec<WalkedFile>> {
        let filter = match pattern {
            Some(p) => FileFilter::new(p)?,
            None => None,
        };
        self.walk_filtered(filter.as_ref())
    }

    pub fn walk_filtered(&self, filter: Option<&FileFilter>) -> SearchResult<Vec<WalkedFile>> {
        let root = self.resolver.root();

        // An unreadable root is the only fatal walk error
        let meta = fs::metadata(root).map_err(|e| SearchError::io(root, e))?;
        if !meta.is_dir() {
            return Err(SearchError::NotADirectory(root.display().to_string()));
        }
        fs::read_dir(root).map_err(|e| SearchError::io(root, e))?;

        let ignored = Arc::clone(&self.ignored_dirs);
        let respect = self.respect_ignore_files;
        let walker = WalkBuilder::new(root)
            .hidden(!self.include_hidden)
            .ignore(respect)
            .parents(respect)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                let name = entry.file_name().to_string_lossy();
                !(is_dir && ignored.iter().any(|d| d == name.as_ref()))
            })
            .build();

        let mut files = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(key) = self.resolver.key_for(entry.path()) else {
                continue;
            };
            if filter.is_some_and(|f| !f.is_match(&key)) {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping file without metadata");
                    continue;
                }
            };

            files.push(WalkedFile {
                path: entry.path().to_path_buf(),
                fingerprint: Fingerprint::from_metadata(&meta),
                key,
            });
        }

        files.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(count = files.len(), root = %root.display(), "walk complete");
        Ok(files)
    }
}
