//! Per-run memoization of resolution results

use rustc_hash::FxHashMap;

use crate::algorithm::resolution::types::{MatchResult, NameMatch, ResolutionKey};

/// Memoized results of one run
///
/// Every distinct raw key is resolved once; later records sharing the key
/// reuse the stored result. State and LGA resolutions are memoized
/// separately because many wards share one LGA.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    index: FxHashMap<ResolutionKey, usize>,
    results: Vec<MatchResult>,
    states: FxHashMap<String, NameMatch>,
    lgas: FxHashMap<(Option<String>, String), NameMatch>,
    ward_history: FxHashMap<String, String>,
    hits: usize,
}

impl ResolutionCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of a cached result, counting the lookup as a hit
    pub fn lookup(&mut self, key: &ResolutionKey) -> Option<usize> {
        let position = self.index.get(key).copied();
        if position.is_some() {
            self.hits += 1;
        }
        position
    }

    /// Store a result and return its position
    pub fn insert(&mut self, result: MatchResult) -> usize {
        let position = self.results.len();
        self.index.insert(result.key.clone(), position);
        self.results.push(result);
        position
    }

    /// Result at a position returned by [`lookup`](Self::lookup) or
    /// [`insert`](Self::insert)
    #[must_use]
    pub fn get(&self, position: usize) -> &MatchResult {
        &self.results[position]
    }

    /// Memoized state resolution for a raw state name
    #[must_use]
    pub fn state(&self, raw: &str) -> Option<&NameMatch> {
        self.states.get(raw)
    }

    /// Memoize a state resolution
    pub fn remember_state(&mut self, raw: &str, resolution: NameMatch) {
        self.states.insert(raw.to_string(), resolution);
    }

    /// Memoized LGA resolution for a raw LGA name within a canonical state
    #[must_use]
    pub fn lga(&self, state: Option<&str>, raw: &str) -> Option<&NameMatch> {
        self.lgas.get(&(state.map(str::to_string), raw.to_string()))
    }

    /// Memoize an LGA resolution
    pub fn remember_lga(&mut self, state: Option<&str>, raw: &str, resolution: NameMatch) {
        self.lgas
            .insert((state.map(str::to_string), raw.to_string()), resolution);
    }

    /// Unit an identical cleaned ward name first resolved to in this run
    #[must_use]
    pub fn prior_unit(&self, ward: &str) -> Option<&str> {
        self.ward_history.get(ward).map(String::as_str)
    }

    /// Record the first unit a cleaned ward name resolved to
    pub fn remember_ward(&mut self, ward: &str, unit_id: &str) {
        self.ward_history
            .entry(ward.to_string())
            .or_insert_with(|| unit_id.to_string());
    }

    /// Number of distinct keys resolved
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing has been resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of lookups answered from the cache
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Results in resolution order
    #[must_use]
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    /// Consume the cache, returning results in resolution order
    #[must_use]
    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }
}
