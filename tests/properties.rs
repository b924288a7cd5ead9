//! Property-based tests for the tokenizer, edit distance, snapshots and
//! result paging.

use findex::chunk::extract;
use findex::index::build::build_document;
use findex::index::{Document, Fingerprint, IndexSnapshot, Occurrence, SnapshotUpdate};
use findex::query::{compile, execute};
use findex::utils::{damerau_levenshtein_within, tokenize};
use proptest::prelude::*;
use std::path::PathBuf;

const KEYS: [&str; 6] = ["a.txt", "b.md", "docs/c.txt", "docs/d.txt", "e.txt", "z/f.txt"];

// ============================================================================
// STRATEGIES
// ============================================================================

fn vocabulary_word() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "alpha", "beta", "gamma", "delta", "omega", "café", "naïve", "über", "добро", "crab",
    ])
    .prop_map(str::to_string)
}

/// Text mixing vocabulary words with punctuation and multi-byte separators
fn text_strategy() -> impl Strategy<Value = String> {
    let separator = prop::sample::select(vec![" ", ", ", ". ", "\n", " - ", "🦀", "\t"]);
    prop::collection::vec((vocabulary_word(), separator), 0..24)
        .prop_map(|parts| parts.into_iter().map(|(w, s)| format!("{}{}", w, s)).collect())
}

/// One optional text per key; `None` means the file does not exist
fn corpus_strategy() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(prop::option::of(text_strategy()), KEYS.len())
}

fn short_string() -> impl Strategy<Value = String> {
    prop::string::string_regex("[abcé]{0,7}").unwrap()
}

// ============================================================================
// HELPERS
// ============================================================================

fn document(key: &str, text: &str) -> Document {
    build_document(
        key,
        &PathBuf::from("/root").join(key),
        Fingerprint::new(text.len() as u64, 1),
        text.as_bytes(),
    )
    .unwrap()
}

fn scratch_snapshot(corpus: &[Option<String>]) -> IndexSnapshot {
    let upserts = KEYS
        .iter()
        .zip(corpus)
        .filter_map(|(key, text)| text.as_deref().map(|t| document(key, t)))
        .collect();
    IndexSnapshot::empty().apply(SnapshotUpdate {
        upserts,
        removals: Vec::new(),
    })
}

fn term_table(snapshot: &IndexSnapshot) -> Vec<(String, Vec<Occurrence>)> {
    snapshot
        .terms()
        .map(|(term, list)| (term.to_string(), list.clone()))
        .collect()
}

fn document_table(snapshot: &IndexSnapshot) -> Vec<Document> {
    snapshot.documents().map(|d| d.as_ref().clone()).collect()
}

/// Textbook optimal-string-alignment distance over chars
fn osa_reference(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        d[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }
    d[a.len()][b.len()]
}

// ============================================================================
// TEXT PROPERTIES
// ============================================================================

proptest! {
    /// Bounded distance agrees with the unbounded reference
    #[test]
    fn prop_distance_matches_reference(a in short_string(), b in short_string(), max in 0usize..4) {
        let expected = osa_reference(&a, &b);
        let got = damerau_levenshtein_within(&a, &b, max);
        if expected <= max {
            prop_assert_eq!(got, Some(expected));
        } else {
            prop_assert_eq!(got, None);
        }
    }

    /// Distance is symmetric
    #[test]
    fn prop_distance_symmetric(a in short_string(), b in short_string()) {
        prop_assert_eq!(
            damerau_levenshtein_within(&a, &b, 3),
            damerau_levenshtein_within(&b, &a, 3)
        );
    }

    /// Token offsets are strictly increasing character offsets into the text,
    /// and each one points at the word it was made from
    #[test]
    fn prop_token_offsets_are_char_accurate(text in text_strategy()) {
        let chars: Vec<char> = text.chars().collect();
        let tokens = tokenize(&text);

        for pair in tokens.windows(2) {
            prop_assert!(pair[0].offset < pair[1].offset);
            prop_assert!(pair[0].position < pair[1].position);
        }
        for token in &tokens {
            let start = token.offset as usize;
            prop_assert!(start < chars.len());
            let word: String = chars[start..].iter().take(token.term.chars().count()).collect();
            prop_assert_eq!(word.to_lowercase(), token.term.clone());
        }
    }

    /// A chunk is exactly the requested character range, clamped
    #[test]
    fn prop_chunk_matches_char_range(
        text in text_strategy(),
        offset_seed in 0usize..1000,
        before in 0usize..20,
        after in 0usize..40,
    ) {
        let total = text.chars().count();
        let offset = offset_seed % (total + 1);
        let chunk = extract("t.txt", &text, offset, before, after).unwrap();

        prop_assert_eq!(chunk.total_chars, total);
        prop_assert_eq!(chunk.start, offset.saturating_sub(before));
        prop_assert_eq!(chunk.end, (offset + after).min(total));
        let expected: String = text.chars().skip(chunk.start).take(chunk.end - chunk.start).collect();
        prop_assert_eq!(chunk.text, expected);

        prop_assert!(extract("t.txt", &text, total + 1, before, after).is_err());
    }
}

// ============================================================================
// SNAPSHOT PROPERTIES
// ============================================================================

proptest! {
    /// Applying a diff to an old snapshot gives the same index as building
    /// the new state from nothing
    #[test]
    fn prop_incremental_equals_scratch(before in corpus_strategy(), after in corpus_strategy()) {
        let base = scratch_snapshot(&before);

        let mut update = SnapshotUpdate::default();
        for ((key, old), new) in KEYS.iter().zip(&before).zip(&after) {
            match (old, new) {
                (Some(_), None) => update.removals.push(key.to_string()),
                (old, Some(text)) if old.as_ref() != Some(text) => {
                    update.upserts.push(document(key, text));
                }
                _ => {}
            }
        }
        let changed = !update.is_empty();
        let incremental = base.apply(update);
        let scratch = scratch_snapshot(&after);

        prop_assert_eq!(term_table(&incremental), term_table(&scratch));
        prop_assert_eq!(document_table(&incremental), document_table(&scratch));
        prop_assert_eq!(incremental.version(), base.version() + 1);
        if !changed {
            prop_assert_eq!(term_table(&incremental), term_table(&base));
        }
    }

    /// Every posting list is sorted by (doc, position) and points at a live document
    #[test]
    fn prop_postings_sorted_and_live(before in corpus_strategy(), after in corpus_strategy()) {
        let base = scratch_snapshot(&before);
        let removals = KEYS
            .iter()
            .zip(&after)
            .filter(|(_, t)| t.is_none())
            .map(|(k, _)| k.to_string())
            .collect();
        let upserts = KEYS
            .iter()
            .zip(&after)
            .filter_map(|(k, t)| t.as_deref().map(|t| document(k, t)))
            .collect();
        let next = base.apply(SnapshotUpdate { upserts, removals });

        for (_, list) in next.terms() {
            prop_assert!(!list.is_empty());
            for pair in list.windows(2) {
                prop_assert!((&pair[0].doc, pair[0].position) < (&pair[1].doc, pair[1].position));
            }
            for occ in list {
                prop_assert!(next.document(&occ.doc).is_some());
            }
        }
    }

    /// Walking the results page by page yields the full ranking exactly once
    #[test]
    fn prop_pages_concatenate_to_full_ranking(
        corpus in corpus_strategy(),
        word in vocabulary_word(),
        page_size in 1usize..6,
    ) {
        let snapshot = scratch_snapshot(&corpus);
        let node = compile(&format!("{}~0", word)).unwrap();
        let full: Vec<_> = execute(&node, &snapshot, None, 0).collect();

        let mut paged = Vec::new();
        let mut skip = 0;
        loop {
            let matches = execute(&node, &snapshot, None, skip);
            prop_assert_eq!(matches.total(), full.len());
            let page: Vec<_> = matches.take(page_size).collect();
            if page.is_empty() {
                break;
            }
            skip += page.len();
            paged.extend(page);
        }
        prop_assert_eq!(paged, full);
    }
}
