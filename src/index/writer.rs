use crate::error::{SearchError, SearchResult};
use crate::index::snapshot::IndexSnapshot;
use crate::utils::{delta_encode, encode_varint, normalize_path, write_str, write_u32_le, write_u64_le};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const SNAPSHOT_FILE: &str = "snapshot.bin";
pub const META_FILE: &str = "meta.json";
pub const MAGIC: &[u8; 4] = b"FIDX";
pub const FORMAT_VERSION: u32 = 2;

/// Human-readable summary written next to the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format_version: u32,
    pub snapshot_version: u64,
    pub root_path: PathBuf,
    pub doc_count: usize,
    pub term_count: usize,
    pub occurrence_count: usize,
    /// Seconds since the Unix epoch
    pub written_at: u64,
}

/// Persist `snapshot` into `index_dir`.
///
/// The binary file is written under a temporary name and renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
pub fn write_snapshot(index_dir: &Path, root: &Path, snapshot: &IndexSnapshot) -> SearchResult<()> {
    fs::create_dir_all(index_dir).map_err(|e| SearchError::io(index_dir, e))?;

    let final_path = index_dir.join(SNAPSHOT_FILE);
    let tmp_path = index_dir.join(format!("{}.tmp", SNAPSHOT_FILE));

    let bytes = encode_snapshot(snapshot, root).map_err(|e| SearchError::io(&tmp_path, e))?;
    {
        let file = File::create(&tmp_path).map_err(|e| SearchError::io(&tmp_path, e))?;
        let mut out = BufWriter::new(file);
        out.write_all(&bytes).map_err(|e| SearchError::io(&tmp_path, e))?;
        let file = out
            .into_inner()
            .map_err(|e| SearchError::io(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| SearchError::io(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, &final_path).map_err(|e| SearchError::io(&final_path, e))?;

    write_meta(index_dir, root, snapshot)?;
    debug!(
        path = %final_path.display(),
        version = snapshot.version(),
        bytes = bytes.len(),
        "snapshot persisted"
    );
    Ok(())
}

/// Serialize a snapshot of the tree at `root` to the on-disk format
pub fn encode_snapshot(snapshot: &IndexSnapshot, root: &Path) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    write_u32_le(&mut out, FORMAT_VERSION)?;
    write_u64_le(&mut out, snapshot.version())?;
    write_str(&mut out, &normalize_path(root))?;

    // Document table, in key order; the ordinal is the row index
    let mut ordinals: HashMap<&str, u32> = HashMap::with_capacity(snapshot.doc_count());
    write_u32_le(&mut out, snapshot.doc_count() as u32)?;
    for (ordinal, doc) in snapshot.documents().enumerate() {
        write_str(&mut out, &doc.key)?;
        write_u64_le(&mut out, doc.fingerprint.size)?;
        write_u64_le(&mut out, doc.fingerprint.mtime_ns)?;
        write_u32_le(&mut out, doc.char_len)?;
        ordinals.insert(doc.key.as_ref(), ordinal as u32);
    }

    // Term dictionary: postings grouped per document
    write_u32_le(&mut out, snapshot.term_count() as u32)?;
    let mut positions = Vec::new();
    let mut offsets = Vec::new();
    for (term, postings) in snapshot.terms() {
        write_str(&mut out, term)?;

        let groups = postings.chunk_by(|a, b| a.doc == b.doc);
        let mut body = Vec::new();
        let mut group_count = 0u32;
        let mut prev_ordinal = 0u32;
        for group in groups {
            let Some(&ordinal) = ordinals.get(group[0].doc.as_ref()) else {
                continue;
            };
            positions.clear();
            offsets.clear();
            positions.extend(group.iter().map(|o| o.position));
            offsets.extend(group.iter().map(|o| o.offset));

            encode_varint(ordinal - prev_ordinal, &mut body);
            encode_varint(group.len() as u32, &mut body);
            delta_encode(&positions, &mut body);
            delta_encode(&offsets, &mut body);
            prev_ordinal = ordinal;
            group_count += 1;
        }

        write_u32_le(&mut out, group_count)?;
        out.write_all(&body)?;
    }

    Ok(out)
}

fn write_meta(index_dir: &Path, root: &Path, snapshot: &IndexSnapshot) -> SearchResult<()> {
    let written_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let meta = IndexMeta {
        format_version: FORMAT_VERSION,
        snapshot_version: snapshot.version(),
        root_path: root.to_path_buf(),
        doc_count: snapshot.doc_count(),
        term_count: snapshot.term_count(),
        occurrence_count: snapshot.occurrence_count(),
        written_at,
    };

    let meta_path = index_dir.join(META_FILE);
    let file = File::create(&meta_path).map_err(|e| SearchError::io(&meta_path, e))?;
    serde_json::to_writer_pretty(file, &meta)
        .map_err(|e| SearchError::io(&meta_path, std::io::Error::other(e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::snapshot::SnapshotUpdate;
    use crate::index::types::{Document, Fingerprint};
    use crate::utils::tokenize;
    use std::sync::Arc;

    fn sample() -> IndexSnapshot {
        let doc = |key: &str, text: &str| Document {
            key: Arc::from(key),
            path: PathBuf::from(key),
            fingerprint: Fingerprint::new(text.len() as u64, 7),
            char_len: text.chars().count() as u32,
            tokens: tokenize(text),
        };
        IndexSnapshot::empty().apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "one two one"), doc("b.txt", "two")],
            removals: vec![],
        })
    }

    #[test]
    fn test_encode_header() {
        let bytes = encode_snapshot(&sample(), Path::new("/root")).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), FORMAT_VERSION);
        assert_eq!(u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[16..18].try_into().unwrap()), 5);
        assert_eq!(&bytes[18..23], b"/root");
    }

    #[test]
    fn test_write_snapshot_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("idx");
        write_snapshot(&index_dir, Path::new("/root"), &sample()).unwrap();

        assert!(index_dir.join(SNAPSHOT_FILE).exists());
        assert!(!index_dir.join(format!("{}.tmp", SNAPSHOT_FILE)).exists());

        let meta: IndexMeta =
            serde_json::from_reader(File::open(index_dir.join(META_FILE)).unwrap()).unwrap();
        assert_eq!(meta.snapshot_version, 1);
        assert_eq!(meta.doc_count, 2);
        assert_eq!(meta.term_count, 2);
        assert_eq!(meta.occurrence_count, 4);
    }
}
