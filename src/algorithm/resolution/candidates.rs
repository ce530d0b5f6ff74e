//! Candidate sets prepared once per run
//!
//! Every registry name is cleaned, keyed and parsed for enumerators up front,
//! so matching a raw name only prepares the raw side.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::CanonicalAdminUnit;
use crate::text::{Enumerated, NameRole, clean_admin_name, match_key, parse_enumerated, phonetic_key};

/// A name with every comparison form precomputed
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedName {
    /// Candidate id (unit id, or the canonical name for states and LGAs)
    pub id: String,
    /// Name as it appears in the registry
    pub display: String,
    /// Cleaned and lowercased, compared by the exact stage
    pub exact: String,
    /// Separator-normalized key
    pub key: String,
    /// Phonetic key
    pub phonetic: String,
    /// Stem and enumerator, when the name ends in one
    pub enumerated: Option<Enumerated>,
}

impl PreparedName {
    /// Prepare a name for a hierarchy role
    pub fn new(id: impl Into<String>, name: &str, role: NameRole) -> Self {
        let cleaned = clean_admin_name(name, role);
        Self {
            id: id.into(),
            display: name.to_string(),
            exact: cleaned.to_lowercase(),
            key: match_key(&cleaned),
            phonetic: phonetic_key(&cleaned),
            enumerated: parse_enumerated(&cleaned),
        }
    }
}

/// A registry ward with its parents
#[derive(Debug, Clone)]
pub struct WardEntry {
    /// Prepared ward name, id is the unit id
    pub name: PreparedName,
    /// Canonical state name
    pub state: String,
    /// Canonical LGA name
    pub lga: Option<String>,
}

/// Candidates of one state
#[derive(Debug, Clone, Default)]
pub struct StatePool {
    /// Distinct LGAs, id is the canonical LGA name
    pub lgas: Vec<PreparedName>,
    /// Ward entry indices per canonical LGA name
    pub wards_by_lga: FxHashMap<String, Vec<usize>>,
    /// Every ward entry index in the state
    pub wards: Vec<usize>,
}

/// Registry candidates indexed by state and LGA
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    wards: Vec<WardEntry>,
    states: Vec<PreparedName>,
    pools: FxHashMap<String, StatePool>,
    all_wards: Vec<usize>,
    all_lgas: Vec<PreparedName>,
    has_lga: bool,
}

impl CandidateIndex {
    /// Index registry units
    ///
    /// Units are kept in the given order, which makes every later scan
    /// deterministic.
    #[must_use]
    pub fn new(units: &[CanonicalAdminUnit]) -> Self {
        let mut index = Self::default();
        let mut seen_lgas: FxHashSet<(String, String)> = FxHashSet::default();
        let mut seen_all_lgas: FxHashSet<String> = FxHashSet::default();

        for (position, unit) in units.iter().enumerate() {
            index.wards.push(WardEntry {
                name: PreparedName::new(unit.unit_id.clone(), &unit.ward, NameRole::Ward),
                state: unit.state.clone(),
                lga: unit.lga.clone(),
            });
            index.all_wards.push(position);

            let pool = index.pools.entry(unit.state.clone()).or_insert_with(|| {
                index
                    .states
                    .push(PreparedName::new(unit.state.clone(), &unit.state, NameRole::State));
                StatePool::default()
            });
            pool.wards.push(position);

            if let Some(lga) = &unit.lga {
                index.has_lga = true;
                pool.wards_by_lga.entry(lga.clone()).or_default().push(position);
                if seen_lgas.insert((unit.state.clone(), lga.clone())) {
                    pool.lgas.push(PreparedName::new(lga.clone(), lga, NameRole::Lga));
                }
                if seen_all_lgas.insert(lga.clone()) {
                    index.all_lgas.push(PreparedName::new(lga.clone(), lga, NameRole::Lga));
                }
            }
        }
        index
    }

    /// Ward entry by index
    #[must_use]
    pub fn ward(&self, index: usize) -> &WardEntry {
        &self.wards[index]
    }

    /// Distinct states
    #[must_use]
    pub fn states(&self) -> &[PreparedName] {
        &self.states
    }

    /// Candidates of a canonical state
    #[must_use]
    pub fn pool(&self, state: &str) -> Option<&StatePool> {
        self.pools.get(state)
    }

    /// Every ward entry index
    #[must_use]
    pub fn all_wards(&self) -> &[usize] {
        &self.all_wards
    }

    /// Distinct LGAs across all states
    #[must_use]
    pub fn all_lgas(&self) -> &[PreparedName] {
        &self.all_lgas
    }

    /// Whether the registry carries an LGA tier
    #[must_use]
    pub fn has_lga(&self) -> bool {
        self.has_lga
    }

    /// Ward entries of the LGA in any state
    #[must_use]
    pub fn wards_in_lga(&self, state: Option<&str>, lga: &str) -> Vec<usize> {
        match state.and_then(|s| self.pools.get(s)) {
            Some(pool) => pool.wards_by_lga.get(lga).cloned().unwrap_or_default(),
            None => self
                .pools
                .values()
                .filter_map(|pool| pool.wards_by_lga.get(lga))
                .flatten()
                .copied()
                .collect::<std::collections::BTreeSet<usize>>()
                .into_iter()
                .collect(),
        }
    }
}
