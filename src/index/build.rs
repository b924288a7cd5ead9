use crate::config::EngineConfig;
use crate::error::{SearchError, SearchResult};
use crate::index::fingerprint::{self, FingerprintDiff};
use crate::index::snapshot::{IndexSnapshot, SnapshotUpdate};
use crate::index::store::IndexStore;
use crate::index::types::{Document, Fingerprint, RefreshStats, WalkedFile};
use crate::index::walker::FileWalker;
use crate::utils::progress::{ProgressBar, tokenizing_bar};
use crate::utils::{PathResolver, char_len, is_binary, strip_bom, tokenize};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Decode and tokenize one file's content
pub fn build_document(
    key: &str,
    path: &Path,
    fingerprint: Fingerprint,
    content: &[u8],
) -> SearchResult<Document> {
    if is_binary(content) {
        return Err(SearchError::undecodable(key, "binary content"));
    }

    let text = std::str::from_utf8(strip_bom(content))
        .map_err(|e| SearchError::undecodable(key, e.to_string()))?;

    let total = char_len(text);
    let char_len = u32::try_from(total)
        .map_err(|_| SearchError::undecodable(key, format!("{} characters is too long", total)))?;

    Ok(Document {
        key: Arc::from(key),
        path: path.to_path_buf(),
        fingerprint,
        char_len,
        tokens: tokenize(text),
    })
}

/// Read, check and tokenize a walked file
fn load_document(file: &WalkedFile, max_file_size: u64) -> SearchResult<Document> {
    if file.fingerprint.size > max_file_size {
        return Err(SearchError::undecodable(
            &file.key,
            format!("{} bytes exceeds the {} byte limit", file.fingerprint.size, max_file_size),
        ));
    }

    let content = fs::read(&file.path).map_err(|e| SearchError::io(&file.path, e))?;
    build_document(&file.key, &file.path, file.fingerprint, &content)
}

/// Produces new snapshots from the filesystem
pub struct IndexBuilder {
    walker: FileWalker,
    max_file_size: u64,
    show_progress: bool,
}

/// Documents produced by one pass, plus what could not be indexed
struct Processed {
    documents: Vec<Document>,
    failed: Vec<String>,
}

impl IndexBuilder {
    pub fn new(config: &EngineConfig, resolver: PathResolver) -> Self {
        Self {
            walker: FileWalker::new(config, resolver),
            max_file_size: config.max_file_size,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while files are tokenized
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Bring the store up to date with the filesystem.
    ///
    /// Only added and changed files are read. Nothing is published when the
    /// walk matches the current snapshot.
    pub fn refresh(&self, store: &IndexStore) -> SearchResult<(Arc<IndexSnapshot>, RefreshStats)> {
        let mut stats = RefreshStats::default();
        let snapshot = store.update(|base| {
            let started = Instant::now();
            let files = self.walker.walk(None)?;
            let FingerprintDiff {
                added,
                changed,
                removed,
            } = fingerprint::diff(&base.fingerprints(), &files);

            let pending: HashSet<&str> = added.iter().chain(&changed).map(String::as_str).collect();
            let to_read: Vec<&WalkedFile> = files
                .iter()
                .filter(|f| pending.contains(f.key.as_str()))
                .collect();
            let processed = self.process(&to_read);

            // A changed file that can no longer be read leaves the index
            let failed: HashSet<&str> = processed.failed.iter().map(String::as_str).collect();
            let mut removals = removed;
            removals.extend(changed.iter().filter(|k| failed.contains(k.as_str())).cloned());

            stats.added = added.iter().filter(|k| !failed.contains(k.as_str())).count();
            stats.changed = changed.iter().filter(|k| !failed.contains(k.as_str())).count();
            stats.removed = removals.len();
            stats.skipped = processed.failed.len();

            let update = SnapshotUpdate {
                upserts: processed.documents,
                removals,
            };
            if update.is_empty() {
                stats.version = base.version();
                stats.documents = base.doc_count();
                return Ok(None);
            }

            let next = base.apply(update);
            stats.version = next.version();
            stats.documents = next.doc_count();
            info!(
                version = stats.version,
                added = stats.added,
                changed = stats.changed,
                removed = stats.removed,
                skipped = stats.skipped,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "index refreshed"
            );
            Ok(Some(next))
        })?;
        Ok((snapshot, stats))
    }

    /// Re-read every file and publish a snapshot built from scratch.
    ///
    /// The version still advances past the current one.
    pub fn rebuild(&self, store: &IndexStore) -> SearchResult<(Arc<IndexSnapshot>, RefreshStats)> {
        let mut stats = RefreshStats::default();
        let snapshot = store.update(|base| {
            let started = Instant::now();
            let files = self.walker.walk(None)?;
            let all: Vec<&WalkedFile> = files.iter().collect();
            let processed = self.process(&all);

            stats.added = processed.documents.len();
            stats.removed = base.doc_count();
            stats.skipped = processed.failed.len();

            let update = SnapshotUpdate {
                upserts: processed.documents,
                removals: base.documents().map(|d| d.key.to_string()).collect(),
            };
            let next = base.apply(update);
            stats.version = next.version();
            stats.documents = next.doc_count();
            info!(
                version = stats.version,
                documents = stats.documents,
                skipped = stats.skipped,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "index rebuilt"
            );
            Ok(Some(next))
        })?;
        Ok((snapshot, stats))
    }

    /// Tokenize files in parallel; failures are logged and reported back
    fn process(&self, files: &[&WalkedFile]) -> Processed {
        let progress = self.progress_bar(files.len());
        let failures = AtomicUsize::new(0);

        let results: Vec<Result<Document, String>> = files
            .par_iter()
            .map(|file| {
                let result = load_document(file, self.max_file_size);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                result.map_err(|err| {
                    failures.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %file.key, error = %err, "skipping file");
                    file.key.clone()
                })
            })
            .collect();

        if let Some(pb) = progress {
            let skipped = failures.load(Ordering::Relaxed);
            pb.finish_with_message(format!(
                "Indexed {} files ({} skipped)",
                files.len() - skipped,
                skipped
            ));
        }

        let mut processed = Processed {
            documents: Vec::with_capacity(results.len()),
            failed: Vec::new(),
        };
        for result in results {
            match result {
                Ok(doc) => processed.documents.push(doc),
                Err(key) => processed.failed.push(key),
            }
        }
        processed
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.show_progress || len == 0 {
            return None;
        }
        Some(tokenizing_bar(len))
    }
}

/// Resolve `root` to the canonical directory every key is relative to
pub fn canonical_root(root: &Path) -> SearchResult<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| SearchError::io(root, e))?;
    if !canonical.is_dir() {
        return Err(SearchError::NotADirectory(root.display().to_string()));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathMode;
    use std::path::Path;

    fn builder_for(root: &Path) -> IndexBuilder {
        let root = canonical_root(root).unwrap();
        let config = EngineConfig::new(&root);
        IndexBuilder::new(&config, PathResolver::new(&root, PathMode::Relative))
    }

    #[test]
    fn test_build_document_strips_bom() {
        let doc = build_document(
            "a.txt",
            Path::new("/r/a.txt"),
            Fingerprint::new(8, 0),
            b"\xEF\xBB\xBFhi you",
        )
        .unwrap();
        assert_eq!(doc.char_len, 6);
        assert_eq!(doc.tokens[1].offset, 3);
    }

    #[test]
    fn test_build_document_rejects_binary_and_invalid_utf8() {
        let fp = Fingerprint::default();
        let path = Path::new("/r/x");
        assert!(matches!(
            build_document("x", path, fp, b"abc\0def"),
            Err(SearchError::Undecodable { .. })
        ));
        assert!(matches!(
            build_document("x", path, fp, &[0x66, 0xFF, 0x67]),
            Err(SearchError::Undecodable { .. })
        ));
    }

    #[test]
    fn test_refresh_incremental() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("b.txt"), "beta").unwrap();

        let builder = builder_for(root);
        let store = IndexStore::default();

        let (s1, stats) = builder.refresh(&store).unwrap();
        assert_eq!(s1.version(), 1);
        assert_eq!(stats.added, 2);
        assert_eq!(stats.documents, 2);

        // Nothing changed: no new version
        let (s1b, stats) = builder.refresh(&store).unwrap();
        assert!(stats.is_noop());
        assert_eq!(s1b.version(), 1);

        fs::remove_file(root.join("a.txt")).unwrap();
        fs::write(root.join("b.txt"), "beta gamma").unwrap();
        fs::write(root.join("c.txt"), "delta").unwrap();

        let (s2, stats) = builder.refresh(&store).unwrap();
        assert_eq!(s2.version(), 2);
        assert_eq!((stats.added, stats.changed, stats.removed), (1, 1, 1));
        assert!(s2.postings("alpha").is_none());
        assert!(s2.postings("gamma").is_some());
        assert!(s2.postings("delta").is_some());

        // The earlier snapshot is unaffected
        assert!(s1.postings("alpha").is_some());
    }

    #[test]
    fn test_refresh_skips_binary_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin.dat"), b"\0\x01\x02").unwrap();
        fs::write(dir.path().join("ok.txt"), "fine").unwrap();

        let store = IndexStore::default();
        let (snapshot, stats) = builder_for(dir.path()).refresh(&store).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(snapshot.doc_count(), 1);
        assert!(snapshot.document("ok.txt").is_some());
    }

    #[test]
    fn test_rebuild_advances_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let builder = builder_for(dir.path());
        let store = IndexStore::default();
        builder.refresh(&store).unwrap();
        let (snapshot, stats) = builder.rebuild(&store).unwrap();

        assert_eq!(snapshot.version(), 2);
        assert_eq!(stats.documents, 1);
        assert!(snapshot.postings("alpha").is_some());
    }
}
