//! Hierarchical identity resolution
//!
//! A raw (state, LGA, ward) key is resolved top-down. The state narrows the
//! LGA candidates, the resolved LGA narrows the ward candidates, and each
//! level runs the same staged matcher. Results are memoized per key for the
//! lifetime of the resolver, which is one run.

use log::{debug, info};

use crate::algorithm::resolution::cache::ResolutionCache;
use crate::algorithm::resolution::candidates::{CandidateIndex, PreparedName};
use crate::algorithm::resolution::stages::{StageOutcome, match_name};
use crate::algorithm::resolution::types::{
    CandidateScore, CanonicalName, MatchResult, NameMatch, ResolutionKey, Technique, TieBreak,
};
use crate::config::FusionConfig;
use crate::models::CanonicalAdminUnit;
use crate::text::NameRole;

/// Candidates kept on state and LGA resolutions
const PARENT_CANDIDATES: usize = 5;

/// Resolves raw location names to registry units
#[derive(Debug)]
pub struct IdentityResolver {
    index: CandidateIndex,
    config: FusionConfig,
    cache: ResolutionCache,
}

/// Turn a parent-level stage outcome into a name match
///
/// Ties between states or LGAs go to the lexicographically smallest name.
fn name_match(raw: &str, candidates: &[&PreparedName], outcome: StageOutcome) -> NameMatch {
    let mut ranked = outcome.candidates;
    ranked.truncate(PARENT_CANDIDATES);

    let mut winners: Vec<&PreparedName> = outcome
        .winners
        .iter()
        .map(|&position| candidates[position])
        .collect();
    winners.sort_by(|a, b| a.id.cmp(&b.id));

    match winners.first() {
        Some(candidate) => NameMatch {
            raw: Some(raw.to_string()),
            id: Some(candidate.id.clone()),
            name: Some(candidate.display.clone()),
            technique: outcome.technique,
            confidence: outcome.confidence,
            tie_break: (winners.len() > 1).then_some(TieBreak::LowestId),
            tied: if winners.len() > 1 {
                winners.iter().map(|winner| winner.id.clone()).collect()
            } else {
                Vec::new()
            },
            candidates: ranked,
        },
        None => NameMatch::unmatched(Some(raw), ranked),
    }
}

/// Audit note for a state or LGA settled by the lowest-id rule
fn parent_tie_note(level: &str, parent: &NameMatch) -> Option<String> {
    if !parent.is_tied() {
        return None;
    }
    Some(format!(
        "{level} '{}' tied between {}; {} chosen",
        parent.raw.as_deref().unwrap_or_default(),
        parent.tied.join(", "),
        parent.id.as_deref().unwrap_or_default()
    ))
}

impl IdentityResolver {
    /// Create a resolver over registry units
    #[must_use]
    pub fn new(units: &[CanonicalAdminUnit], config: &FusionConfig) -> Self {
        let index = CandidateIndex::new(units);
        info!(
            "Prepared {} ward candidates in {} states",
            index.all_wards().len(),
            index.states().len()
        );
        Self {
            index,
            config: *config,
            cache: ResolutionCache::new(),
        }
    }

    /// Resolve a raw key, reusing the memoized result when there is one
    pub fn resolve(&mut self, key: &ResolutionKey) -> &MatchResult {
        let position = self.resolve_position(key);
        self.cache.get(position)
    }

    /// Resolve a raw key and return the position of its result in the cache
    pub fn resolve_position(&mut self, key: &ResolutionKey) -> usize {
        if let Some(position) = self.cache.lookup(key) {
            return position;
        }

        let result = self.compute(key);
        if let (Some(unit_id), Some(ward)) = (&result.unit_id, &key.ward) {
            let ward_key = PreparedName::new("", ward, NameRole::Ward).exact;
            self.cache.remember_ward(&ward_key, unit_id);
        }
        self.cache.insert(result)
    }

    /// The run's memoized results
    #[must_use]
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Consume the resolver, keeping its cache
    #[must_use]
    pub fn into_cache(self) -> ResolutionCache {
        self.cache
    }

    fn resolve_state(&mut self, raw: &str) -> NameMatch {
        if let Some(known) = self.cache.state(raw) {
            return known.clone();
        }
        let prepared = PreparedName::new("", raw, NameRole::State);
        let candidates: Vec<&PreparedName> = self.index.states().iter().collect();
        let outcome = match_name(&prepared, &candidates, &self.config);
        let resolution = name_match(raw, &candidates, outcome);
        self.cache.remember_state(raw, resolution.clone());
        resolution
    }

    fn resolve_lga(&mut self, state: Option<&str>, raw: &str) -> NameMatch {
        if let Some(known) = self.cache.lga(state, raw) {
            return known.clone();
        }
        let prepared = PreparedName::new("", raw, NameRole::Lga);
        let candidates: Vec<&PreparedName> = match state.and_then(|s| self.index.pool(s)) {
            Some(pool) => pool.lgas.iter().collect(),
            None => self.index.all_lgas().iter().collect(),
        };
        let outcome = match_name(&prepared, &candidates, &self.config);
        let resolution = name_match(raw, &candidates, outcome);
        self.cache.remember_lga(state, raw, resolution.clone());
        resolution
    }

    fn state_wards(&self, state: Option<&str>) -> Vec<usize> {
        state
            .and_then(|s| self.index.pool(s))
            .map_or_else(|| self.index.all_wards().to_vec(), |pool| pool.wards.clone())
    }

    fn match_wards(&self, raw: &PreparedName, pool: &[usize]) -> StageOutcome {
        let candidates: Vec<&PreparedName> =
            pool.iter().map(|&entry| &self.index.ward(entry).name).collect();
        match_name(raw, &candidates, &self.config)
    }

    /// Pick one entry among tied ward winners
    fn break_tie(
        &self,
        entries: &[usize],
        ward_key: &str,
        lga: Option<&str>,
    ) -> (usize, Option<TieBreak>) {
        if let [only] = entries {
            return (*only, None);
        }

        if let Some(prior) = self.cache.prior_unit(ward_key) {
            if let Some(&entry) = entries
                .iter()
                .find(|&&entry| self.index.ward(entry).name.id == prior)
            {
                return (entry, Some(TieBreak::PriorResolution));
            }
        }

        let mut remaining = entries.to_vec();
        if let Some(lga) = lga {
            let same_lga: Vec<usize> = entries
                .iter()
                .copied()
                .filter(|&entry| self.index.ward(entry).lga.as_deref() == Some(lga))
                .collect();
            if let [only] = same_lga.as_slice() {
                return (*only, Some(TieBreak::SameLga));
            }
            if !same_lga.is_empty() {
                remaining = same_lga;
            }
        }

        let lowest = remaining
            .iter()
            .copied()
            .min_by(|&a, &b| self.index.ward(a).name.id.cmp(&self.index.ward(b).name.id))
            .unwrap_or(entries[0]);
        (lowest, Some(TieBreak::LowestId))
    }

    fn compute(&mut self, key: &ResolutionKey) -> MatchResult {
        let mut notes: Vec<String> = Vec::new();
        let mut low_confidence = false;

        let state_match = key.state.as_deref().map(|raw| self.resolve_state(raw));
        let mut canonical_state = state_match.as_ref().and_then(|m| m.id.clone());
        if canonical_state.is_none() {
            if let [only] = self.index.states() {
                if let Some(raw) = key.state.as_deref() {
                    notes.push(format!(
                        "state '{raw}' unresolved; registry's only state {} assumed",
                        only.id
                    ));
                }
                canonical_state = Some(only.id.clone());
            } else if key.state.is_some() {
                notes.push("state unresolved; searched every state".to_string());
                low_confidence = true;
            }
        }

        let lga_match = if self.index.has_lga() {
            key.lga
                .as_deref()
                .map(|raw| self.resolve_lga(canonical_state.as_deref(), raw))
        } else {
            notes.push("registry has no LGA tier; ward searched without LGA".to_string());
            low_confidence = true;
            None
        };
        let canonical_lga = lga_match.as_ref().and_then(|m| m.id.clone());

        let parent_ties = [("state", state_match.as_ref()), ("LGA", lga_match.as_ref())]
            .into_iter()
            .filter_map(|(level, parent)| parent.and_then(|p| parent_tie_note(level, p)));
        for note in parent_ties {
            notes.push(note);
            low_confidence = true;
        }

        let mut searched = match &canonical_lga {
            Some(lga) => self.index.wards_in_lga(canonical_state.as_deref(), lga),
            None => {
                if self.index.has_lga() {
                    notes.push("LGA unresolved; ward searched state-wide".to_string());
                    low_confidence = true;
                }
                self.state_wards(canonical_state.as_deref())
            }
        };

        let unmatched = |notes: Vec<String>, candidates: Vec<CandidateScore>| MatchResult {
            key: key.clone(),
            unit_id: None,
            canonical: None,
            technique: Technique::Unmatched,
            confidence: 0.0,
            state: state_match.clone(),
            lga: lga_match.clone(),
            candidates,
            tie_break: None,
            tied: Vec::new(),
            low_confidence: true,
            notes,
        };

        let Some(raw_ward) = key.ward.as_deref() else {
            notes.push("no ward name".to_string());
            return unmatched(notes, Vec::new());
        };
        let raw = PreparedName::new("", raw_ward, NameRole::Ward);

        let mut outcome = self.match_wards(&raw, &searched);
        if !outcome.technique.is_match() && canonical_lga.is_some() && self.config.state_wide_fallback
        {
            let state_pool = self.state_wards(canonical_state.as_deref());
            if state_pool.len() > searched.len() {
                let fallback = self.match_wards(&raw, &state_pool);
                if fallback.technique.is_match() {
                    notes.push("matched by state-wide fallback outside the resolved LGA".to_string());
                    low_confidence = true;
                    outcome = fallback;
                    searched = state_pool;
                }
            }
        }

        if !outcome.technique.is_match() {
            notes.extend(outcome.note);
            debug!("Unresolved {key}: {}", notes.join("; "));
            return unmatched(notes, outcome.candidates);
        }

        let winners: Vec<usize> = outcome.winners.iter().map(|&p| searched[p]).collect();
        let (chosen, tie_break) = self.break_tie(&winners, &raw.exact, canonical_lga.as_deref());
        if tie_break == Some(TieBreak::LowestId) {
            notes.push(format!("{} candidates tied; lowest id chosen", winners.len()));
            low_confidence = true;
        }

        let entry = self.index.ward(chosen);
        debug!(
            "Resolved {key} to {} ({}, {:.1})",
            entry.name.id, outcome.technique, outcome.confidence
        );
        MatchResult {
            key: key.clone(),
            unit_id: Some(entry.name.id.clone()),
            canonical: Some(CanonicalName {
                state: entry.state.clone(),
                lga: entry.lga.clone(),
                ward: entry.name.display.clone(),
            }),
            technique: outcome.technique,
            confidence: outcome.confidence,
            state: state_match.clone(),
            lga: lga_match.clone(),
            candidates: outcome.candidates,
            tied: if tie_break.is_some() {
                winners
                    .iter()
                    .map(|&winner| self.index.ward(winner).name.id.clone())
                    .collect()
            } else {
                Vec::new()
            },
            tie_break,
            low_confidence,
            notes,
        }
    }
}

/// Resolve one raw location against registry units
///
/// Builds a throwaway resolver; use [`IdentityResolver`] to resolve many
/// keys with memoization.
#[must_use]
pub fn resolve(
    state: Option<&str>,
    lga: Option<&str>,
    ward: Option<&str>,
    candidates: &[CanonicalAdminUnit],
    config: &FusionConfig,
) -> MatchResult {
    let mut resolver = IdentityResolver::new(candidates, config);
    resolver
        .resolve(&ResolutionKey::new(state, lga, ward))
        .clone()
}
