//! Character-accurate windows of file text.
//!
//! Offsets here are the same character offsets the index reports, so a
//! search hit can be passed straight to [`ChunkExtractor::read`].

use crate::error::{SearchError, SearchResult};
use crate::utils::{PathResolver, strip_bom};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;

/// A window of a file's decoded text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub key: String,
    /// First character of the window
    pub start: usize,
    /// One past the last character of the window
    pub end: usize,
    /// Length of the whole file in characters
    pub total_chars: usize,
    pub text: String,
}

pub struct ChunkExtractor {
    resolver: PathResolver,
    before: usize,
    after: usize,
}

impl ChunkExtractor {
    pub fn new(resolver: PathResolver, before: usize, after: usize) -> Self {
        Self {
            resolver,
            before,
            after,
        }
    }

    /// Read the window around `offset` in the file at `input`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so any file can be
    /// read even if it was never indexed.
    pub fn read(&self, input: &str, offset: usize) -> SearchResult<Chunk> {
        let key = self.resolver.resolve(input)?;
        let path = self.resolver.locate(&key);

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SearchError::FileNotFound(input.to_string()));
            }
            Err(e) => return Err(SearchError::io(&path, e)),
        };
        if meta.is_dir() {
            return Err(SearchError::NotAFile(input.to_string()));
        }
        self.resolver.ensure_contained(input, &path)?;

        let bytes = fs::read(&path).map_err(|e| SearchError::io(&path, e))?;
        let text: Cow<'_, str> = String::from_utf8_lossy(strip_bom(&bytes));
        extract(&key, &text, offset, self.before, self.after)
    }
}

/// Cut `[offset - before, offset + after)` out of `text`, clamped to its
/// bounds. `offset == length` is valid and yields the tail of the text.
pub fn extract(
    key: &str,
    text: &str,
    offset: usize,
    before: usize,
    after: usize,
) -> SearchResult<Chunk> {
    let total_chars = text.chars().count();
    if offset > total_chars {
        return Err(SearchError::InvalidOffset {
            key: key.to_string(),
            offset,
            length: total_chars,
        });
    }

    let start = offset.saturating_sub(before);
    let end = offset.saturating_add(after).min(total_chars);

    let byte_start = byte_index(text, start);
    let byte_end = byte_index(text, end);

    Ok(Chunk {
        key: key.to_string(),
        start,
        end,
        total_chars,
        text: text[byte_start..byte_end].to_string(),
    })
}

/// Byte position of the `char_index`-th character (or the end of `text`)
fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathMode;

    #[test]
    fn test_extract_window_clamped() {
        let text = "a".repeat(2000);
        let chunk = extract("f", &text, 50, 100, 900).unwrap();
        assert_eq!((chunk.start, chunk.end), (0, 950));
        assert_eq!(chunk.text.len(), 950);

        let chunk = extract("f", &text, 1500, 100, 900).unwrap();
        assert_eq!((chunk.start, chunk.end), (1400, 2000));
        assert_eq!(chunk.total_chars, 2000);
    }

    #[test]
    fn test_extract_at_end_and_beyond() {
        let chunk = extract("f", "hello", 5, 100, 900).unwrap();
        assert_eq!((chunk.start, chunk.end), (0, 5));
        assert_eq!(chunk.text, "hello");

        match extract("f", "hello", 6, 100, 900) {
            Err(SearchError::InvalidOffset { offset, length, .. }) => {
                assert_eq!((offset, length), (6, 5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extract_multibyte_boundaries() {
        let text = "日本語のテキスト🦀と英語";
        let chunk = extract("f", text, 8, 2, 3).unwrap();
        assert_eq!((chunk.start, chunk.end), (6, 11));
        assert_eq!(chunk.text, "スト🦀と英");
        assert_eq!(chunk.text.chars().count(), chunk.end - chunk.start);
    }

    #[test]
    fn test_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let extractor = ChunkExtractor::new(PathResolver::new(dir.path(), PathMode::Relative), 100, 900);

        assert!(matches!(extractor.read("missing.txt", 0), Err(SearchError::FileNotFound(_))));
        assert!(matches!(extractor.read("sub", 0), Err(SearchError::NotAFile(_))));
        assert!(matches!(extractor.read("../x", 0), Err(SearchError::InvalidPath { .. })));
    }

    #[test]
    fn test_read_lossy_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"\xEF\xBB\xBFab\xFFcd").unwrap();
        let extractor = ChunkExtractor::new(PathResolver::new(dir.path(), PathMode::Relative), 100, 900);

        let chunk = extractor.read("/a.txt", 0).unwrap();
        assert_eq!(chunk.key, "a.txt");
        assert_eq!(chunk.text, "ab\u{FFFD}cd");
        assert_eq!(chunk.total_chars, 5);
    }
}
