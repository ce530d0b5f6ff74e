//! String similarity scores on a 0-100 scale
//!
//! All scores are built on normalized Levenshtein similarity. Token-based
//! variants make the score insensitive to word order (`Dala Gwale` against
//! `Gwale Dala`) and to extra words.

use itertools::Itertools;
use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Weight applied to the token-set ratio in the composite score
///
/// A token-set ratio of 100 only says one name's words are a subset of the
/// other's, so it must not tie with a full-string match.
pub const TOKEN_SET_WEIGHT: f64 = 0.95;

/// Levenshtein similarity of two strings, 0-100
///
/// Empty input scores 0 against anything.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b) * 100.0
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Similarity after sorting the words of both strings
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted = |text: &str| tokens(text).sorted().join(" ");
    ratio(&sorted(a), &sorted(b))
}

/// Similarity of the shared words against each string's full word set
///
/// Scores 100 whenever one string's words are a subset of the other's.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = tokens(a).collect();
    let set_b: BTreeSet<String> = tokens(b).collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let shared = set_a.intersection(&set_b).join(" ");
    let only_a = set_a.difference(&set_b).join(" ");
    let only_b = set_b.difference(&set_a).join(" ");

    let combine = |rest: &str| {
        if shared.is_empty() {
            rest.to_string()
        } else if rest.is_empty() {
            shared.clone()
        } else {
            format!("{shared} {rest}")
        }
    };
    let with_a = combine(&only_a);
    let with_b = combine(&only_b);

    let mut best = ratio(&with_a, &with_b);
    if !shared.is_empty() {
        best = best.max(ratio(&shared, &with_a)).max(ratio(&shared, &with_b));
    }
    best
}

/// Composite similarity used for ranking candidates
///
/// The maximum of the plain ratio, the token-sort ratio and the weighted
/// token-set ratio. Comparison is case-insensitive.
#[must_use]
pub fn composite_score(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    ratio(&a, &b)
        .max(token_sort_ratio(&a, &b))
        .max(TOKEN_SET_WEIGHT * token_set_ratio(&a, &b))
}
