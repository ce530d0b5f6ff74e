//! Ordinal disambiguation of enumerated sibling names
//!
//! `Gwale 1`, `Gwale I` and `Gwale A` are the same sibling written three
//! ways, while `Gwale I` and `Gwale II` are different wards that differ by a
//! single character. String similarity ranks them the wrong way round, so
//! when the raw name carries an enumerator and the candidates have siblings
//! with the same stem, only a sibling with the same ordinal may match.

use serde::Serialize;

use crate::algorithm::resolution::candidates::PreparedName;
use crate::algorithm::resolution::similarity::composite_score;
use crate::algorithm::resolution::types::ORDINAL_CONFIDENCE_CAP;
use crate::text::{EnumeratorKind, phonetic_key};

/// Result of checking a raw name against enumerated siblings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Disambiguation {
    /// The raw name has no enumerator or the candidates have no siblings
    NotApplicable,
    /// Siblings with the raw name's ordinal were found
    Matched {
        /// Indices of the matching siblings in the candidate slice
        winners: Vec<usize>,
        /// Stem similarity capped at the ordinal confidence
        confidence: f64,
        /// Canonical ordinal of the raw name
        ordinal: u32,
    },
    /// Siblings exist but none carries the raw name's ordinal
    NoSibling {
        /// Canonical ordinal of the raw name
        ordinal: u32,
        /// Number of same-stem siblings seen
        siblings: usize,
    },
}

/// Similarity of two stems, 100 for equal stems
fn stem_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    let phonetic_a = phonetic_key(a);
    if !phonetic_a.is_empty() && phonetic_a == phonetic_key(b) {
        return composite_score(a, b).max(ORDINAL_CONFIDENCE_CAP);
    }
    composite_score(a, b)
}

/// Whether the sibling set is Roman-numbered
///
/// Plain letters (`A`, `B`) switch the set to letter numbering unless a
/// multi-character Roman numeral is present. Sets of Arabic numerals or bare
/// `I`/`V`/`X` are read as Roman.
fn roman_context(kinds: impl Iterator<Item = EnumeratorKind> + Clone) -> bool {
    if kinds.clone().any(|kind| kind == EnumeratorKind::Roman) {
        return true;
    }
    !kinds.clone().any(|kind| kind == EnumeratorKind::Letter)
}

/// Match a raw enumerated name against same-stem siblings by ordinal
#[must_use]
pub fn disambiguate(
    raw: &PreparedName,
    candidates: &[&PreparedName],
    stem_threshold: f64,
) -> Disambiguation {
    let Some(raw_enumerated) = &raw.enumerated else {
        return Disambiguation::NotApplicable;
    };

    let siblings: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(position, candidate)| {
            let enumerated = candidate.enumerated.as_ref()?;
            let similarity = stem_similarity(&raw_enumerated.stem, &enumerated.stem);
            (similarity >= stem_threshold).then_some((position, similarity))
        })
        .collect();

    if siblings.is_empty() {
        return Disambiguation::NotApplicable;
    }

    let kinds = siblings
        .iter()
        .filter_map(|&(position, _)| candidates[position].enumerated.as_ref())
        .map(|enumerated| enumerated.enumerator.kind)
        .chain(std::iter::once(raw_enumerated.enumerator.kind));
    let roman = roman_context(kinds);

    let ordinal = raw_enumerated.enumerator.ordinal(roman);
    let matching: Vec<(usize, f64)> = siblings
        .iter()
        .copied()
        .filter(|&(position, _)| {
            candidates[position]
                .enumerated
                .as_ref()
                .is_some_and(|enumerated| enumerated.enumerator.ordinal(roman) == ordinal)
        })
        .collect();

    if matching.is_empty() {
        return Disambiguation::NoSibling {
            ordinal,
            siblings: siblings.len(),
        };
    }

    let best = matching
        .iter()
        .map(|&(_, similarity)| similarity)
        .fold(f64::MIN, f64::max);
    Disambiguation::Matched {
        winners: matching
            .iter()
            .filter(|&&(_, similarity)| (similarity - best).abs() < 1e-9)
            .map(|&(position, _)| position)
            .collect(),
        confidence: best.min(ORDINAL_CONFIDENCE_CAP),
        ordinal,
    }
}
