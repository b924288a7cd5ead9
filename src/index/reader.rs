use crate::error::{SearchError, SearchResult};
use crate::index::snapshot::IndexSnapshot;
use crate::index::types::{DocKey, Document, Fingerprint, Occurrence, PostingList};
use crate::index::writer::{FORMAT_VERSION, IndexMeta, MAGIC, META_FILE, SNAPSHOT_FILE};
use crate::utils::{PathResolver, SliceReader, Token, normalize_path};
use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Load the snapshot persisted in `index_dir`.
///
/// Returns `Ok(None)` when nothing has been written yet. Source files are
/// never touched; document paths are rebuilt from the keys via `resolver`.
pub fn read_snapshot(index_dir: &Path, resolver: &PathResolver) -> SearchResult<Option<IndexSnapshot>> {
    let path = index_dir.join(SNAPSHOT_FILE);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SearchError::io(&path, e)),
    };

    // SAFETY: the file is only replaced by rename, never written in place
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SearchError::io(&path, e))?;
    let snapshot = decode_snapshot(&mmap, resolver).map_err(|reason| SearchError::corrupt(&path, reason))?;

    debug!(
        path = %path.display(),
        version = snapshot.version(),
        documents = snapshot.doc_count(),
        "snapshot loaded"
    );
    Ok(Some(snapshot))
}

/// Read the informational summary, if present
pub fn read_meta(index_dir: &Path) -> SearchResult<Option<IndexMeta>> {
    let path = index_dir.join(META_FILE);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SearchError::io(&path, e)),
    };
    serde_json::from_reader(file)
        .map(Some)
        .map_err(|e| SearchError::corrupt(&path, e.to_string()))
}

/// Parse the on-disk format back into a snapshot
pub fn decode_snapshot(bytes: &[u8], resolver: &PathResolver) -> Result<IndexSnapshot, String> {
    let mut r = SliceReader::new(bytes);

    if r.bytes(4) != Some(MAGIC.as_slice()) {
        return Err("bad magic".to_string());
    }
    let format = r.u32_le().ok_or("truncated header")?;
    if format != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", format));
    }
    let version = r.u64_le().ok_or("truncated header")?;
    let root = r.str().ok_or("truncated header")?;
    let expected = normalize_path(resolver.root());
    if root != expected {
        return Err(format!("index was built for '{}', not '{}'", root, expected));
    }

    let doc_count = r.u32_le().ok_or("truncated document table")? as usize;
    let mut rows = Vec::with_capacity(doc_count.min(r.remaining()));
    for _ in 0..doc_count {
        let key = r.str().ok_or("truncated document key")?;
        let size = r.u64_le().ok_or("truncated document row")?;
        let mtime = r.u64_le().ok_or("truncated document row")?;
        let char_len = r.u32_le().ok_or("truncated document row")?;
        rows.push((DocKey::from(key), Fingerprint::new(size, mtime), char_len));
    }

    let mut tokens: Vec<Vec<Token>> = vec![Vec::new(); rows.len()];
    let mut terms: BTreeMap<String, Arc<PostingList>> = BTreeMap::new();

    let term_count = r.u32_le().ok_or("truncated term dictionary")?;
    for _ in 0..term_count {
        let term = r.str().ok_or("truncated term")?.to_string();
        let groups = r.u32_le().ok_or("truncated term header")?;

        let mut postings = PostingList::new();
        let mut ordinal = 0u32;
        for _ in 0..groups {
            ordinal = ordinal
                .checked_add(r.varint().ok_or("truncated posting group")?)
                .ok_or("document ordinal overflow")?;
            let (key, _, char_len) = rows
                .get(ordinal as usize)
                .ok_or_else(|| format!("document ordinal {} out of range", ordinal))?;
            let count = r.varint().ok_or("truncated posting group")? as usize;
            let positions = r.deltas(count).ok_or("truncated positions")?;
            let offsets = r.deltas(count).ok_or("truncated offsets")?;

            for (&position, &offset) in positions.iter().zip(&offsets) {
                if offset > *char_len {
                    return Err(format!("offset {} beyond end of '{}'", offset, key));
                }
                postings.push(Occurrence {
                    doc: key.clone(),
                    position,
                    offset,
                });
                tokens[ordinal as usize].push(Token {
                    term: term.clone(),
                    position,
                    offset,
                });
            }
        }

        if postings.is_empty() {
            return Err(format!("term '{}' has no postings", term));
        }
        terms.insert(term, Arc::new(postings));
    }

    if !r.is_empty() {
        return Err(format!("trailing bytes at {}", r.position()));
    }

    let mut documents = BTreeMap::new();
    for ((key, fingerprint, char_len), mut doc_tokens) in rows.into_iter().zip(tokens) {
        doc_tokens.sort_by_key(|t| t.position);
        let doc = Document {
            path: resolver.locate(&key),
            key: key.clone(),
            fingerprint,
            char_len,
            tokens: doc_tokens,
        };
        documents.insert(key, Arc::new(doc));
    }

    Ok(IndexSnapshot::from_parts(version, documents, terms))
}
