use crate::index::snapshot::IndexSnapshot;
use crate::index::types::PostingList;
use crate::query::parser::QueryNode;
use crate::query::scorer::{EXACT_WEIGHT, PREFIX_WEIGHT, fuzzy_weight};
use crate::utils::{damerau_levenshtein_within, is_indexable};

/// An indexed word selected by a query term
#[derive(Debug, Clone)]
pub struct ExpandedTerm<'s> {
    pub term: &'s str,
    pub postings: &'s PostingList,
    pub weight: f32,
}

/// Query tree with every term resolved against one snapshot
#[derive(Debug)]
pub enum QueryPlan<'s> {
    /// Union of the postings of the selected words
    Terms(Vec<ExpandedTerm<'s>>),
    /// Postings per phrase word; `None` if any word is absent from the index
    Phrase(Option<Vec<&'s PostingList>>),
    And(Box<QueryPlan<'s>>, Box<QueryPlan<'s>>),
    Or(Box<QueryPlan<'s>>, Box<QueryPlan<'s>>),
}

impl<'s> QueryPlan<'s> {
    pub fn new(node: &QueryNode, snapshot: &'s IndexSnapshot) -> Self {
        match node {
            QueryNode::Term { text, fuzzy, prefix } => {
                QueryPlan::Terms(expand(snapshot, text, *fuzzy, *prefix))
            }
            QueryNode::Phrase(words) => QueryPlan::Phrase(
                words
                    .iter()
                    .map(|w| snapshot.postings(w))
                    .collect::<Option<Vec<_>>>(),
            ),
            QueryNode::And(left, right) => QueryPlan::And(
                Box::new(Self::new(left, snapshot)),
                Box::new(Self::new(right, snapshot)),
            ),
            QueryNode::Or(left, right) => QueryPlan::Or(
                Box::new(Self::new(left, snapshot)),
                Box::new(Self::new(right, snapshot)),
            ),
        }
    }

    /// Number of distinct indexed words the plan reads
    pub fn term_count(&self) -> usize {
        match self {
            QueryPlan::Terms(terms) => terms.len(),
            QueryPlan::Phrase(lists) => lists.as_ref().map_or(0, Vec::len),
            QueryPlan::And(l, r) | QueryPlan::Or(l, r) => l.term_count() + r.term_count(),
        }
    }
}

/// Indexed words matching one query term, with their occurrence weight
pub fn expand<'s>(
    snapshot: &'s IndexSnapshot,
    text: &str,
    fuzzy: Option<u8>,
    prefix: bool,
) -> Vec<ExpandedTerm<'s>> {
    // Words this long are never indexed
    if !is_indexable(text) {
        return Vec::new();
    }
    if prefix {
        return snapshot
            .terms_with_prefix(text)
            .map(|(term, postings)| ExpandedTerm {
                term,
                postings,
                weight: if term == text { EXACT_WEIGHT } else { PREFIX_WEIGHT },
            })
            .collect();
    }

    match fuzzy {
        Some(max) if max > 0 => snapshot
            .terms()
            .filter_map(|(term, postings)| {
                let distance = damerau_levenshtein_within(text, term, max as usize)?;
                Some(ExpandedTerm {
                    term,
                    postings,
                    weight: fuzzy_weight(distance),
                })
            })
            .collect(),
        _ => snapshot
            .term_entry(text)
            .map(|(term, postings)| ExpandedTerm {
                term,
                postings,
                weight: EXACT_WEIGHT,
            })
            .into_iter()
            .collect(),
    }
}
