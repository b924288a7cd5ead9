//! Error types for indexing, querying and reading.

use std::path::PathBuf;

/// Result type alias for search engine operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors surfaced by the search engine.
///
/// Per-file problems hit while walking or indexing are logged and skipped by
/// the builder; everything else reaches the caller through one of these.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The path escapes the search root or is malformed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A directory (or other entry) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file requested for reading does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The path resolves to a file where a directory was expected.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// The path resolves to a directory where a file was expected.
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// I/O failure on a specific path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The query string could not be compiled.
    #[error("Query syntax error at '{fragment}': {message}")]
    QuerySyntax { fragment: String, message: String },

    /// A character offset lies beyond the end of the document.
    #[error("Offset {offset} is beyond the end of '{key}' ({length} characters)")]
    InvalidOffset { key: String, offset: usize, length: usize },

    /// A file filter glob could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// File content is binary or not valid UTF-8.
    #[error("Cannot decode '{key}' as text: {reason}")]
    Undecodable { key: String, reason: String },

    /// A persisted snapshot could not be read back.
    #[error("Corrupt index file '{path}': {reason}")]
    CorruptIndex { path: PathBuf, reason: String },
}

impl SearchError {
    /// Creates a new `InvalidPath` error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Io` error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `QuerySyntax` error.
    pub fn query_syntax(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuerySyntax {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPattern` error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Undecodable` error.
    pub fn undecodable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Undecodable {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `CorruptIndex` error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
