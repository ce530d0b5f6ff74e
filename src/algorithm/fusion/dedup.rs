//! Registry deduplication
//!
//! Registries exported from GIS tools sometimes carry the same ward twice
//! (split polygons, re-digitized boundaries). Units sharing a normalized
//! (state, LGA, ward) identity collapse into the one with the smallest id.

use log::warn;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::CanonicalAdminUnit;

/// Units collapsed into one during deduplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryCollapse {
    /// Unit kept in the working copy
    pub kept: String,
    /// Units dropped from the working copy
    pub dropped: Vec<String>,
    /// Shared identity, `state / lga / ward`
    pub identity: String,
    /// Whether any dropped geometry differs from the kept one
    pub geometry_differs: bool,
}

fn identity_label(unit: &CanonicalAdminUnit) -> String {
    let (state, lga, ward) = unit.identity();
    format!("{state} / {} / {ward}", lga.as_deref().unwrap_or("-"))
}

/// Collapse units with identical identities
///
/// The working copy keeps groups in order of first appearance; within a group
/// the unit with the lexicographically smallest id survives.
#[must_use]
pub fn deduplicate(units: &[CanonicalAdminUnit]) -> (Vec<CanonicalAdminUnit>, Vec<RegistryCollapse>) {
    let mut groups: Vec<Vec<&CanonicalAdminUnit>> = Vec::new();
    let mut positions: FxHashMap<(String, Option<String>, String), usize> = FxHashMap::default();

    for unit in units {
        let position = *positions.entry(unit.identity()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[position].push(unit);
    }

    let mut working = Vec::with_capacity(groups.len());
    let mut collapses = Vec::new();
    for group in groups {
        let Some(kept) = group.iter().min_by(|a, b| a.unit_id.cmp(&b.unit_id)).copied() else {
            continue;
        };
        if group.len() > 1 {
            let dropped: Vec<String> = group
                .iter()
                .filter(|unit| unit.unit_id != kept.unit_id)
                .map(|unit| unit.unit_id.clone())
                .collect();
            let geometry_differs = group.iter().any(|unit| unit.geometry != kept.geometry);
            let identity = identity_label(kept);
            warn!(
                "Collapsed duplicate registry units for {identity}: kept {}, dropped {}{}",
                kept.unit_id,
                dropped.join(", "),
                if geometry_differs { " (geometries differ)" } else { "" }
            );
            collapses.push(RegistryCollapse {
                kept: kept.unit_id.clone(),
                dropped,
                identity,
                geometry_differs,
            });
        }
        working.push(kept.clone());
    }
    (working, collapses)
}
