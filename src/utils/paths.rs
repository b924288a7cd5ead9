//! Path normalization under the search root
//!
//! Every path entering or leaving the engine goes through [`PathResolver`].
//! Internally a file is identified by its canonical key: root-relative,
//! `/`-separated, with no `.` or `..` segments. The root itself is `""`.

use crate::config::PathMode;
use crate::error::{SearchError, SearchResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolves caller paths to canonical keys and renders keys back
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    mode: PathMode,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, mode: PathMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> PathMode {
        self.mode
    }

    /// Lexically normalize `input` to a canonical key.
    ///
    /// A leading `/` means root-relative. An absolute path is accepted only
    /// when it lies under the root.
    pub fn resolve(&self, input: &str) -> SearchResult<String> {
        if input.contains('\0') {
            return Err(SearchError::invalid_path(input, "contains a NUL byte"));
        }

        let unified = input.replace('\\', "/");
        let as_path = Path::new(&unified);

        if as_path.is_absolute() && as_path.starts_with(&self.root) {
            let rest = as_path.strip_prefix(&self.root).unwrap_or(as_path);
            return self.normalize_segments(input, &normalize_path(rest));
        }
        if has_foreign_prefix(&unified) {
            return Err(SearchError::invalid_path(input, "absolute path outside the search root"));
        }

        self.normalize_segments(input, unified.trim_start_matches('/'))
    }

    /// Like [`resolve`](Self::resolve), but the path must exist and its
    /// canonical form (symlinks followed) must stay under the root.
    pub fn resolve_existing(&self, input: &str) -> SearchResult<String> {
        let key = self.resolve(input)?;
        let full = self.locate(&key);
        if !full.exists() {
            return Err(SearchError::invalid_path(input, "does not exist"));
        }
        self.ensure_contained(input, &full)?;
        Ok(key)
    }

    /// Check that `full` (which must exist) does not escape the root
    /// through a symlink.
    pub fn ensure_contained(&self, input: &str, full: &Path) -> SearchResult<()> {
        let canonical_root = self
            .root
            .canonicalize()
            .map_err(|e| SearchError::io(&self.root, e))?;
        let canonical = full.canonicalize().map_err(|e| SearchError::io(full, e))?;
        if canonical.starts_with(&canonical_root) {
            Ok(())
        } else {
            Err(SearchError::invalid_path(input, "resolves outside the search root"))
        }
    }

    /// Absolute filesystem path for a key
    pub fn locate(&self, key: &str) -> PathBuf {
        if key.is_empty() {
            return self.root.clone();
        }
        key.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    /// Key for a path discovered under the root (walker output)
    pub fn key_for(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let key = rest
            .components()
            .filter_map(|c| match c {
                Component::Normal(seg) => Some(seg.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        Some(key)
    }

    /// Render a key using the configured mode
    pub fn render(&self, key: &str) -> String {
        self.render_as(key, self.mode)
    }

    pub fn render_as(&self, key: &str, mode: PathMode) -> String {
        match mode {
            PathMode::Relative => key.to_string(),
            PathMode::Absolute => normalize_path(&self.locate(key)),
        }
    }

    fn normalize_segments(&self, input: &str, relative: &str) -> SearchResult<String> {
        let mut segments: Vec<&str> = Vec::new();
        for seg in relative.split('/') {
            match seg {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(SearchError::invalid_path(input, "escapes the search root"));
                    }
                }
                other => segments.push(other),
            }
        }
        Ok(segments.join("/"))
    }
}

/// Drive letters and UNC prefixes can never be root-relative.
fn has_foreign_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    has_drive || path.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/project", PathMode::Relative)
    }

    #[test]
    fn test_normalize_path() {
        let path = Path::new("src/main.rs");
        assert_eq!(normalize_path(path), "src/main.rs");
    }

    #[test]
    fn test_resolve_relative() {
        let r = resolver();
        assert_eq!(r.resolve("docs/x.md").unwrap(), "docs/x.md");
        assert_eq!(r.resolve("./docs//x.md").unwrap(), "docs/x.md");
        assert_eq!(r.resolve("docs\\x.md").unwrap(), "docs/x.md");
    }

    #[test]
    fn test_resolve_leading_slash_is_root_relative() {
        let r = resolver();
        assert_eq!(r.resolve("/docs/x.md").unwrap(), "docs/x.md");
        assert_eq!(r.resolve("/").unwrap(), "");
        assert_eq!(r.resolve("").unwrap(), "");
    }

    #[test]
    fn test_resolve_absolute_under_root() {
        let r = resolver();
        assert_eq!(r.resolve("/project/docs/x.md").unwrap(), "docs/x.md");
        assert_eq!(r.resolve("/project").unwrap(), "");
    }

    #[test]
    fn test_resolve_dotdot_inside_root() {
        let r = resolver();
        assert_eq!(r.resolve("docs/../src/lib.rs").unwrap(), "src/lib.rs");
    }

    #[test]
    fn test_resolve_traversal_rejected() {
        let r = resolver();
        assert!(matches!(r.resolve("../etc/passwd"), Err(SearchError::InvalidPath { .. })));
        assert!(matches!(r.resolve("docs/../../x"), Err(SearchError::InvalidPath { .. })));
        assert!(matches!(r.resolve("C:/Windows"), Err(SearchError::InvalidPath { .. })));
        assert!(matches!(r.resolve("a\0b"), Err(SearchError::InvalidPath { .. })));
    }

    #[test]
    fn test_render_modes() {
        let r = resolver();
        assert_eq!(r.render("docs/x.md"), "docs/x.md");
        assert_eq!(r.render_as("docs/x.md", PathMode::Absolute), "/project/docs/x.md");
    }

    #[test]
    fn test_key_for() {
        let r = resolver();
        assert_eq!(
            r.key_for(Path::new("/project/src/main.rs")),
            Some("src/main.rs".to_string())
        );
        assert_eq!(r.key_for(Path::new("/other/file.rs")), None);
    }

    #[test]
    fn test_resolve_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let r = PathResolver::new(dir.path(), PathMode::Relative);
        assert_eq!(r.resolve_existing("a.txt").unwrap(), "a.txt");
        assert!(matches!(
            r.resolve_existing("missing.txt"),
            Err(SearchError::InvalidPath { .. })
        ));
    }
}
