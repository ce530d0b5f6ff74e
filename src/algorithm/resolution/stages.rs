//! The staged name matcher
//!
//! Stages run in order and the first one that accepts a candidate decides:
//! exact, separator-normalized, ordinal disambiguation (when the raw name is
//! enumerated and has siblings), phonetic, fuzzy.

use log::debug;

use crate::algorithm::resolution::candidates::PreparedName;
use crate::algorithm::resolution::disambiguation::{Disambiguation, disambiguate};
use crate::algorithm::resolution::similarity::composite_score;
use crate::algorithm::resolution::types::{
    CandidateScore, EXACT_CONFIDENCE, NORMALIZED_CONFIDENCE, PHONETIC_CONFIDENCE_CAP, Technique,
};
use crate::config::FusionConfig;

const SCORE_EPSILON: f64 = 1e-9;

/// What the stages decided for one raw name
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    /// Accepting stage, or `Unmatched`
    pub technique: Technique,
    /// Confidence of the accepting stage
    pub confidence: f64,
    /// Positions in the candidate slice tied for the win
    pub winners: Vec<usize>,
    /// Every candidate with its composite score, best first
    pub candidates: Vec<CandidateScore>,
    /// Why nothing matched, when nothing did
    pub note: Option<String>,
}

impl StageOutcome {
    fn accept(technique: Technique, confidence: f64, winners: Vec<usize>) -> Self {
        Self {
            technique,
            confidence,
            winners,
            candidates: Vec::new(),
            note: None,
        }
    }

    fn reject(note: impl Into<String>) -> Self {
        Self {
            technique: Technique::Unmatched,
            confidence: 0.0,
            winners: Vec::new(),
            candidates: Vec::new(),
            note: Some(note.into()),
        }
    }
}

fn positions(
    candidates: &[&PreparedName],
    accept: impl Fn(usize, &PreparedName) -> bool,
) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|&(position, candidate)| accept(position, *candidate))
        .map(|(position, _)| position)
        .collect()
}

fn best_of(positions: &[usize], scores: &[f64]) -> Option<(f64, Vec<usize>)> {
    let best = positions
        .iter()
        .map(|&position| scores[position])
        .fold(None, |best: Option<f64>, score| Some(best.map_or(score, |b| b.max(score))))?;
    let tied = positions
        .iter()
        .copied()
        .filter(|&position| (scores[position] - best).abs() < SCORE_EPSILON)
        .collect();
    Some((best, tied))
}

fn ranked(candidates: &[&PreparedName], scores: &[f64]) -> Vec<CandidateScore> {
    let mut ranked: Vec<CandidateScore> = candidates
        .iter()
        .zip(scores)
        .map(|(candidate, &score)| CandidateScore {
            id: candidate.id.clone(),
            name: candidate.display.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    ranked
}

/// Run the matching stages for one raw name
#[must_use]
pub fn match_name(
    raw: &PreparedName,
    candidates: &[&PreparedName],
    config: &FusionConfig,
) -> StageOutcome {
    let scores: Vec<f64> = candidates
        .iter()
        .map(|candidate| composite_score(&raw.exact, &candidate.exact))
        .collect();

    let mut outcome = run_stages(raw, candidates, &scores, config);
    outcome.candidates = ranked(candidates, &scores);
    debug!(
        "Matched '{}' by {} ({:.1}) among {} candidates",
        raw.display,
        outcome.technique,
        outcome.confidence,
        candidates.len()
    );
    outcome
}

fn run_stages(
    raw: &PreparedName,
    candidates: &[&PreparedName],
    scores: &[f64],
    config: &FusionConfig,
) -> StageOutcome {
    if raw.exact.is_empty() {
        return StageOutcome::reject("empty name");
    }
    if candidates.is_empty() {
        return StageOutcome::reject("no candidates");
    }

    let exact = positions(candidates, |_, c| c.exact == raw.exact);
    if !exact.is_empty() {
        return StageOutcome::accept(Technique::Exact, EXACT_CONFIDENCE, exact);
    }

    if !raw.key.is_empty() {
        let normalized = positions(candidates, |_, c| c.key == raw.key);
        if !normalized.is_empty() {
            return StageOutcome::accept(Technique::Normalized, NORMALIZED_CONFIDENCE, normalized);
        }
    }

    let fuzzy_threshold = f64::from(config.fuzzy_threshold);
    if config.ordinal_disambiguation {
        match disambiguate(raw, candidates, fuzzy_threshold) {
            Disambiguation::Matched {
                winners,
                confidence,
                ..
            } => {
                return StageOutcome::accept(Technique::OrdinalDisambiguated, confidence, winners);
            }
            Disambiguation::NoSibling { ordinal, siblings } => {
                return StageOutcome::reject(format!(
                    "none of {siblings} enumerated siblings has ordinal {ordinal}"
                ));
            }
            Disambiguation::NotApplicable => {}
        }
    }

    if !raw.phonetic.is_empty() {
        let phonetic_min = f64::from(config.phonetic_min_similarity);
        let collisions = positions(candidates, |position, c| {
            c.phonetic == raw.phonetic && scores[position] >= phonetic_min
        });
        if let Some((best, winners)) = best_of(&collisions, scores) {
            return StageOutcome::accept(
                Technique::Phonetic,
                best.min(PHONETIC_CONFIDENCE_CAP),
                winners,
            );
        }
    }

    let all: Vec<usize> = (0..candidates.len()).collect();
    match best_of(&all, scores) {
        Some((best, winners)) if best >= fuzzy_threshold => {
            StageOutcome::accept(Technique::Fuzzy, best, winners)
        }
        Some((best, _)) => StageOutcome::reject(format!(
            "best similarity {best:.1} is below the threshold {fuzzy_threshold}"
        )),
        None => StageOutcome::reject("no candidates"),
    }
}
