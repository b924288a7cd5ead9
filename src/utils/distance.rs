//! Bounded edit distance for fuzzy term expansion.
//!
//! Damerau-Levenshtein in its optimal-string-alignment form: insertions,
//! deletions, substitutions and adjacent transpositions each cost one, and
//! no substring is edited twice. Works on `char`s, not bytes.

/// Edit distance between `a` and `b` if it is at most `max`.
///
/// Two early exits: the length difference is a lower bound on the
/// distance, and once two consecutive DP rows exceed `max` no later cell
/// (including a transposition reaching back two rows) can come back under it.
pub fn damerau_levenshtein_within(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let d = a.len().max(b.len());
        return (d <= max).then_some(d);
    }

    let width = b.len() + 1;
    let mut prev2: Vec<usize> = vec![0; width];
    let mut prev: Vec<usize> = (0..width).collect();
    let mut cur: Vec<usize> = vec![0; width];
    let mut prev_min = 0usize;

    for i in 1..=a.len() {
        cur[0] = i;
        let mut row_min = cur[0];

        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut value = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                value = value.min(prev2[j - 2] + 1);
            }
            cur[j] = value;
            row_min = row_min.min(value);
        }

        if row_min > max && prev_min > max {
            return None;
        }
        prev_min = row_min;

        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }

    let d = prev[b.len()];
    (d <= max).then_some(d)
}
