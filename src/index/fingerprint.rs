//! Change detection between a snapshot and a fresh walk.
//!
//! Two fingerprints are equal iff size and mtime are both equal. A content
//! change that keeps both (same size, rewritten within the filesystem's
//! timestamp resolution) goes unnoticed until the next size or mtime change.

use crate::index::types::{Fingerprint, WalkedFile};
use std::collections::{BTreeMap, HashSet};

/// Partition of a walk against previously indexed fingerprints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl FingerprintDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare `previous` (key → fingerprint) with the `current` walk.
///
/// Output vectors are sorted by key.
pub fn diff(previous: &BTreeMap<String, Fingerprint>, current: &[WalkedFile]) -> FingerprintDiff {
    let mut result = FingerprintDiff::default();
    let seen: HashSet<&str> = current.iter().map(|f| f.key.as_str()).collect();

    for file in current {
        match previous.get(&file.key) {
            None => result.added.push(file.key.clone()),
            Some(fp) if *fp != file.fingerprint => result.changed.push(file.key.clone()),
            Some(_) => {}
        }
    }

    result.removed = previous
        .keys()
        .filter(|key| !seen.contains(key.as_str()))
        .cloned()
        .collect();

    result.added.sort();
    result.changed.sort();
    result
}
