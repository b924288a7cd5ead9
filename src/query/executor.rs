use crate::index::snapshot::IndexSnapshot;
use crate::index::types::{DocKey, PostingList, SearchMatch};
use crate::index::walker::FileFilter;
use crate::query::parser::QueryNode;
use crate::query::planner::QueryPlan;
use crate::query::scorer::{EXACT_WEIGHT, Ranked, score};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::Arc;
use tracing::debug;

/// One matched occurrence inside a document
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    offset: u32,
    weight: f32,
}

/// Matched occurrences by document, keyed by token position
type Hits = FxHashMap<DocKey, BTreeMap<u32, Hit>>;

/// Ranked results of one query, drained lazily.
///
/// Owns its data, so it outlives the snapshot it was computed from. It can
/// be consumed only once.
#[derive(Debug)]
pub struct Matches {
    heap: BinaryHeap<Ranked>,
    total: usize,
    skip: usize,
}

impl Matches {
    fn new(heap: BinaryHeap<Ranked>, skip: usize) -> Self {
        Self {
            total: heap.len(),
            heap,
            skip,
        }
    }

    pub fn empty() -> Self {
        Self::new(BinaryHeap::new(), 0)
    }

    /// Number of results before `skip` was applied
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for Matches {
    type Item = SearchMatch;

    fn next(&mut self) -> Option<SearchMatch> {
        while self.skip > 0 {
            self.skip -= 1;
            self.heap.pop()?;
        }
        self.heap.pop().map(SearchMatch::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.heap.len().saturating_sub(self.skip);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Matches {}

/// Evaluates compiled queries against one snapshot
pub struct QueryExecutor<'s> {
    snapshot: &'s IndexSnapshot,
    candidates: Option<FxHashSet<&'s str>>,
}

impl<'s> QueryExecutor<'s> {
    pub fn new(snapshot: &'s IndexSnapshot) -> Self {
        Self {
            snapshot,
            candidates: None,
        }
    }

    /// Only consider documents whose key matches `filter`
    pub fn with_filter(mut self, filter: Option<&FileFilter>) -> Self {
        self.candidates = filter.map(|f| {
            self.snapshot
                .documents()
                .map(|doc| doc.key.as_ref())
                .filter(|key| f.is_match(key))
                .collect()
        });
        self
    }

    pub fn execute(&self, node: &QueryNode, skip: usize) -> Matches {
        if self.candidates.as_ref().is_some_and(|c| c.is_empty()) {
            return Matches::empty();
        }

        let plan = QueryPlan::new(node, self.snapshot);
        let hits = self.evaluate(&plan);

        let mut heap = BinaryHeap::new();
        for (key, positions) in hits {
            let matched = positions.len();
            for hit in positions.into_values() {
                heap.push(Ranked {
                    score: score(hit.weight, matched),
                    key: Arc::clone(&key),
                    offset: hit.offset,
                });
            }
        }

        debug!(
            terms = plan.term_count(),
            results = heap.len(),
            skip,
            "query executed"
        );
        Matches::new(heap, skip)
    }

    fn evaluate(&self, plan: &QueryPlan<'_>) -> Hits {
        match plan {
            QueryPlan::Terms(terms) => {
                let mut hits = Hits::default();
                for expanded in terms {
                    for occ in expanded.postings.iter().filter(|o| self.admits(&o.doc)) {
                        record(
                            &mut hits,
                            &occ.doc,
                            occ.position,
                            Hit {
                                offset: occ.offset,
                                weight: expanded.weight,
                            },
                        );
                    }
                }
                hits
            }
            QueryPlan::Phrase(None) => Hits::default(),
            QueryPlan::Phrase(Some(lists)) => self.phrase(lists),
            QueryPlan::And(left, right) => {
                let left = self.evaluate(left);
                if left.is_empty() {
                    return left;
                }
                let mut right = self.evaluate(right);
                let mut merged = Hits::default();
                for (key, mut positions) in left {
                    if let Some(other) = right.remove(&key) {
                        merge(&mut positions, other);
                        merged.insert(key, positions);
                    }
                }
                merged
            }
            QueryPlan::Or(left, right) => {
                let mut merged = self.evaluate(left);
                for (key, positions) in self.evaluate(right) {
                    match merged.get_mut(&key) {
                        Some(existing) => merge(existing, positions),
                        None => {
                            merged.insert(key, positions);
                        }
                    }
                }
                merged
            }
        }
    }

    /// Occurrences of the first word followed by every other word at the
    /// next positions of the same document
    fn phrase(&self, lists: &[&PostingList]) -> Hits {
        let mut hits = Hits::default();
        let Some((first, rest)) = lists.split_first() else {
            return hits;
        };

        for occ in first.iter().filter(|o| self.admits(&o.doc)) {
            let adjacent = rest.iter().enumerate().all(|(i, list)| {
                let Some(wanted) = occ.position.checked_add(i as u32 + 1) else {
                    return false;
                };
                list.binary_search_by(|o| o.doc.cmp(&occ.doc).then(o.position.cmp(&wanted)))
                    .is_ok()
            });
            if adjacent {
                record(
                    &mut hits,
                    &occ.doc,
                    occ.position,
                    Hit {
                        offset: occ.offset,
                        weight: EXACT_WEIGHT,
                    },
                );
            }
        }
        hits
    }

    fn admits(&self, key: &str) -> bool {
        self.candidates.as_ref().is_none_or(|c| c.contains(key))
    }
}

/// Evaluate `node` against `snapshot` and drop the first `skip` results
pub fn execute(
    node: &QueryNode,
    snapshot: &IndexSnapshot,
    filter: Option<&FileFilter>,
    skip: usize,
) -> Matches {
    QueryExecutor::new(snapshot)
        .with_filter(filter)
        .execute(node, skip)
}

/// Insert a hit, keeping the higher weight for a position seen twice
fn record(hits: &mut Hits, doc: &DocKey, position: u32, hit: Hit) {
    match hits.entry(Arc::clone(doc)).or_default().entry(position) {
        Entry::Vacant(slot) => {
            slot.insert(hit);
        }
        Entry::Occupied(mut slot) => {
            if hit.weight > slot.get().weight {
                slot.insert(hit);
            }
        }
    }
}

fn merge(into: &mut BTreeMap<u32, Hit>, from: BTreeMap<u32, Hit>) {
    for (position, hit) in from {
        match into.entry(position) {
            Entry::Vacant(slot) => {
                slot.insert(hit);
            }
            Entry::Occupied(mut slot) => {
                if hit.weight > slot.get().weight {
                    slot.insert(hit);
                }
            }
        }
    }
}
