//! Immutable, versioned view of the whole index.
//!
//! A published snapshot is never mutated. [`IndexSnapshot::apply`] builds the
//! next version by cloning the two top-level maps (documents and postings
//! are `Arc`-shared, so this copies pointers, not text) and rewriting only
//! the posting lists of terms touched by the update.

use crate::index::types::{DocKey, Document, Fingerprint, Occurrence, PostingList};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;

/// Documents to add or replace, and keys to drop
#[derive(Debug, Default)]
pub struct SnapshotUpdate {
    pub upserts: Vec<Document>,
    pub removals: Vec<String>,
}

impl SnapshotUpdate {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    version: u64,
    documents: BTreeMap<DocKey, Arc<Document>>,
    terms: BTreeMap<String, Arc<PostingList>>,
}

impl IndexSnapshot {
    /// Version 0, no documents
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a snapshot from already-consistent parts (persistence)
    pub(crate) fn from_parts(
        version: u64,
        documents: BTreeMap<DocKey, Arc<Document>>,
        terms: BTreeMap<String, Arc<PostingList>>,
    ) -> Self {
        Self {
            version,
            documents,
            terms,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Total number of indexed word occurrences
    pub fn occurrence_count(&self) -> usize {
        self.terms.values().map(|list| list.len()).sum()
    }

    pub fn document(&self, key: &str) -> Option<&Arc<Document>> {
        self.documents.get(key)
    }

    /// Documents in key order
    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }

    /// Key → fingerprint table, as consumed by the fingerprint tracker
    pub fn fingerprints(&self) -> BTreeMap<String, Fingerprint> {
        self.documents
            .iter()
            .map(|(key, doc)| (key.to_string(), doc.fingerprint))
            .collect()
    }

    /// Postings of an exact term
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term).map(|list| list.as_ref())
    }

    /// Exact term with its postings, borrowing the stored key
    pub fn term_entry(&self, term: &str) -> Option<(&str, &PostingList)> {
        self.terms
            .get_key_value(term)
            .map(|(t, list)| (t.as_str(), list.as_ref()))
    }

    /// All terms with their postings, in term order
    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingList)> {
        self.terms.iter().map(|(t, list)| (t.as_str(), list.as_ref()))
    }

    /// Terms starting with `prefix`, in term order
    pub fn terms_with_prefix<'a, 'p>(
        &'a self,
        prefix: &'p str,
    ) -> impl Iterator<Item = (&'a str, &'a PostingList)> + use<'a, 'p> {
        self.terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(t, _)| t.starts_with(prefix))
            .map(|(t, list)| (t.as_str(), list.as_ref()))
    }

    /// Build the next version. Removed and replaced documents have their
    /// postings purged before replacements are added; `self` is untouched.
    pub fn apply(&self, update: SnapshotUpdate) -> IndexSnapshot {
        let SnapshotUpdate { upserts, removals } = update;

        // Last write wins if a key is upserted twice
        let mut incoming: BTreeMap<String, Document> = BTreeMap::new();
        for doc in upserts {
            incoming.insert(doc.key.to_string(), doc);
        }

        let mut documents = self.documents.clone();
        let mut purged: HashSet<DocKey> = HashSet::new();
        let mut touched: BTreeSet<String> = BTreeSet::new();

        for key in removals.iter().map(String::as_str).chain(incoming.keys().map(String::as_str)) {
            if let Some(old) = documents.remove(key) {
                touched.extend(old.terms().into_iter().map(str::to_string));
                purged.insert(old.key.clone());
            }
        }

        let mut fresh: HashMap<String, PostingList> = HashMap::new();
        for doc in incoming.into_values() {
            for token in &doc.tokens {
                fresh.entry(token.term.clone()).or_default().push(Occurrence {
                    doc: doc.key.clone(),
                    position: token.position,
                    offset: token.offset,
                });
            }
            touched.extend(doc.terms().into_iter().map(str::to_string));
            documents.insert(doc.key.clone(), Arc::new(doc));
        }

        let mut terms = self.terms.clone();
        for term in touched {
            let mut list: PostingList = match terms.get(&term) {
                Some(existing) => existing
                    .iter()
                    .filter(|occ| !purged.contains(&occ.doc))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            };

            if let Some(added) = fresh.remove(&term) {
                list.extend(added);
                list.sort_by(|a, b| a.doc.cmp(&b.doc).then(a.position.cmp(&b.position)));
            }

            if list.is_empty() {
                terms.remove(&term);
            } else {
                terms.insert(term, Arc::new(list));
            }
        }

        IndexSnapshot {
            version: self.version + 1,
            documents,
            terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::Fingerprint;
    use crate::utils::tokenize;
    use std::path::PathBuf;

    fn doc(key: &str, text: &str) -> Document {
        Document {
            key: Arc::from(key),
            path: PathBuf::from(format!("/r/{}", key)),
            fingerprint: Fingerprint::new(text.len() as u64, 1),
            char_len: text.chars().count() as u32,
            tokens: tokenize(text),
        }
    }

    fn docs_for<'a>(snapshot: &'a IndexSnapshot, term: &str) -> Vec<&'a str> {
        let mut keys: Vec<&str> = snapshot
            .postings(term)
            .map(|list| list.iter().map(|o| o.doc.as_ref()).collect())
            .unwrap_or_default();
        keys.dedup();
        keys
    }

    #[test]
    fn test_apply_adds_documents_and_bumps_version() {
        let s0 = IndexSnapshot::empty();
        let s1 = s0.apply(SnapshotUpdate {
            upserts: vec![doc("b.txt", "goodbye world"), doc("a.txt", "hello world")],
            removals: vec![],
        });

        assert_eq!(s0.version(), 0);
        assert_eq!(s1.version(), 1);
        assert_eq!(s1.doc_count(), 2);
        assert_eq!(docs_for(&s1, "world"), vec!["a.txt", "b.txt"]);
        assert_eq!(s1.postings("hello").unwrap()[0].offset, 0);
        assert_eq!(s1.postings("world").unwrap()[0].offset, 6);
    }

    #[test]
    fn test_apply_is_copy_on_write() {
        let s1 = IndexSnapshot::empty().apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "alpha beta")],
            removals: vec![],
        });
        let s2 = s1.apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "gamma")],
            removals: vec![],
        });

        // Old snapshot still sees the old content
        assert_eq!(docs_for(&s1, "alpha"), vec!["a.txt"]);
        assert!(s1.postings("gamma").is_none());

        // New snapshot replaced the document wholesale
        assert!(s2.postings("alpha").is_none());
        assert!(s2.postings("beta").is_none());
        assert_eq!(docs_for(&s2, "gamma"), vec!["a.txt"]);
        assert_eq!(s2.doc_count(), 1);
    }

    #[test]
    fn test_apply_removal_purges_postings() {
        let s1 = IndexSnapshot::empty().apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "shared only_a"), doc("b.txt", "shared")],
            removals: vec![],
        });
        let s2 = s1.apply(SnapshotUpdate {
            upserts: vec![],
            removals: vec!["a.txt".to_string()],
        });

        assert!(s2.document("a.txt").is_none());
        assert!(s2.postings("only_a").is_none());
        assert_eq!(docs_for(&s2, "shared"), vec!["b.txt"]);
    }

    #[test]
    fn test_offsets_strictly_increasing_per_document() {
        let s = IndexSnapshot::empty().apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "x y x z x")],
            removals: vec![],
        });
        let offsets: Vec<u32> = s.postings("x").unwrap().iter().map(|o| o.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8]);
    }

    #[test]
    fn test_terms_with_prefix() {
        let s = IndexSnapshot::empty().apply(SnapshotUpdate {
            upserts: vec![doc("a.txt", "world worn wax word")],
            removals: vec![],
        });
        let terms: Vec<&str> = s.terms_with_prefix("wor").map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["word", "world", "worn"]);
    }
}
