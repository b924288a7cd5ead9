use crate::utils::Token;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Canonical document key shared between the document table and postings
pub type DocKey = Arc<str>;

/// Cheap change detector for a file: byte size plus modification time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    pub size: u64,
    /// Nanoseconds since the Unix epoch (0 if unavailable)
    pub mtime_ns: u64,
}

impl Fingerprint {
    pub fn new(size: u64, mtime_ns: u64) -> Self {
        Self { size, mtime_ns }
    }

    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let mtime_ns = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(meta.len(), mtime_ns)
    }
}

/// A file found by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub key: String,
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}

/// One indexed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: DocKey,
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    /// Length of the decoded text in characters
    pub char_len: u32,
    /// Word sequence with positions and character offsets
    pub tokens: Vec<Token>,
}

impl Document {
    /// Distinct terms of this document, sorted
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.tokens.iter().map(|t| t.term.as_str()).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }
}

/// One occurrence of a term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub doc: DocKey,
    /// Token position within the document
    pub position: u32,
    /// Character offset within the document
    pub offset: u32,
}

/// Occurrences of one term, sorted by (doc, position)
pub type PostingList = Vec<Occurrence>;

/// Search match result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub key: DocKey,
    /// Character offset of the match start
    pub offset: u32,
    pub score: f32,
}

/// Summary of a refresh or rebuild pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub version: u64,
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
    /// Files left out because they were unreadable, undecodable or too large
    pub skipped: usize,
    pub documents: usize,
}

impl RefreshStats {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.changed == 0 && self.removed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tokenize;

    #[test]
    fn test_document_terms_deduplicated() {
        let doc = Document {
            key: Arc::from("a.txt"),
            path: PathBuf::from("/r/a.txt"),
            fingerprint: Fingerprint::new(11, 1),
            char_len: 11,
            tokens: tokenize("b a b c a"),
        };
        assert_eq!(doc.terms(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fingerprint_equality() {
        assert_eq!(Fingerprint::new(10, 5), Fingerprint::new(10, 5));
        assert_ne!(Fingerprint::new(10, 5), Fingerprint::new(10, 6));
        assert_ne!(Fingerprint::new(10, 5), Fingerprint::new(11, 5));
    }
}
