//! Joining ward metrics to registry geometry

use std::time::Instant;

use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::algorithm::aggregation::WardMetric;
use crate::algorithm::fusion::dedup::{RegistryCollapse, deduplicate};
use crate::models::{BoundaryRegistry, CanonicalAdminUnit, unit_identity};
use crate::report::Anomaly;
use crate::utils::logging::log_operation_complete;

/// How a fused row was joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinKind {
    /// Joined on (state, LGA, ward)
    Full,
    /// Joined on (state, ward) because the unit has no LGA
    Reduced,
}

/// A ward metric with its geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedRow {
    /// The ward metric
    pub metric: WardMetric,
    /// Registry unit the geometry belongs to
    pub unit_id: String,
    /// Geometry as supplied by the registry
    pub geometry: String,
    /// Join used
    pub join: JoinKind,
    /// Whether the metric joined more than one geometry
    pub ambiguous: bool,
}

/// A ward metric with no geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnjoinedWard {
    /// The ward metric
    pub metric: WardMetric,
    /// Why the join failed
    pub reason: String,
}

/// Ward metrics joined to geometry
#[derive(Debug, Clone, Default, Serialize)]
pub struct FusedDataset {
    /// Joined rows
    pub rows: Vec<FusedRow>,
    /// Metrics without geometry
    pub unjoined: Vec<UnjoinedWard>,
    /// Fan-outs found while joining
    pub anomalies: Vec<Anomaly>,
}

impl FusedDataset {
    /// Number of joined rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing was joined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Joins ward metrics to a deduplicated working copy of the registry
#[derive(Debug, Clone)]
pub struct GeometryFuser {
    units: Vec<CanonicalAdminUnit>,
    collapses: Vec<RegistryCollapse>,
    full: FxHashMap<(String, Option<String>, String), Vec<usize>>,
    reduced: FxHashMap<(String, String), Vec<usize>>,
}

impl GeometryFuser {
    /// Build the run's working copy of a registry
    #[must_use]
    pub fn new(registry: &BoundaryRegistry) -> Self {
        let (units, collapses) = deduplicate(registry.units());
        if !collapses.is_empty() {
            info!(
                "Registry working copy has {} units after {} collapses",
                units.len(),
                collapses.len()
            );
        }

        let mut full: FxHashMap<_, Vec<usize>> = FxHashMap::default();
        let mut reduced: FxHashMap<_, Vec<usize>> = FxHashMap::default();
        for (position, unit) in units.iter().enumerate() {
            let (state, lga, ward) = unit.identity();
            reduced
                .entry((state.clone(), ward.clone()))
                .or_default()
                .push(position);
            full.entry((state, lga, ward)).or_default().push(position);
        }

        Self {
            units,
            collapses,
            full,
            reduced,
        }
    }

    /// The deduplicated working copy
    #[must_use]
    pub fn units(&self) -> &[CanonicalAdminUnit] {
        &self.units
    }

    /// Collapses made while building the working copy
    #[must_use]
    pub fn collapses(&self) -> &[RegistryCollapse] {
        &self.collapses
    }

    /// Collapses as report anomalies
    #[must_use]
    pub fn collapse_anomalies(&self) -> Vec<Anomaly> {
        self.collapses
            .iter()
            .map(|collapse| Anomaly::DuplicateRegistryFeature {
                kept: collapse.kept.clone(),
                dropped: collapse.dropped.clone(),
                identity: collapse.identity.clone(),
                geometry_differs: collapse.geometry_differs,
            })
            .collect()
    }

    /// Join metrics to geometries
    ///
    /// The join key is the composite (state, LGA, ward) identity. A metric
    /// without an LGA (the registry has no LGA tier for its unit) joins on
    /// (state, ward) instead; every geometry of a resulting fan-out is kept
    /// and flagged.
    #[must_use]
    pub fn fuse(&self, metrics: &[WardMetric]) -> FusedDataset {
        let start = Instant::now();
        let mut dataset = FusedDataset::default();

        for metric in metrics {
            let (state, lga, ward) =
                unit_identity(&metric.state, metric.lga.as_deref(), &metric.ward);
            let (join, matched) = match lga {
                Some(_) => (JoinKind::Full, self.full.get(&(state, lga, ward))),
                None => (JoinKind::Reduced, self.reduced.get(&(state, ward))),
            };

            let Some(positions) = matched.filter(|positions| !positions.is_empty()) else {
                dataset.unjoined.push(UnjoinedWard {
                    metric: metric.clone(),
                    reason: format!(
                        "no registry unit for {} / {} / {}",
                        metric.state,
                        metric.lga.as_deref().unwrap_or("-"),
                        metric.ward
                    ),
                });
                continue;
            };

            let ambiguous = positions.len() > 1;
            if ambiguous {
                let candidates: Vec<String> = positions
                    .iter()
                    .map(|&position| self.units[position].unit_id.clone())
                    .collect();
                warn!(
                    "Ward '{}' of {} joined {} geometries: {}",
                    metric.ward,
                    metric.unit_id,
                    positions.len(),
                    candidates.join(", ")
                );
                dataset.anomalies.push(Anomaly::AmbiguousJoin {
                    unit_id: metric.unit_id.clone(),
                    ward: metric.ward.clone(),
                    candidates,
                });
            }

            for &position in positions {
                let unit = &self.units[position];
                dataset.rows.push(FusedRow {
                    metric: metric.clone(),
                    unit_id: unit.unit_id.clone(),
                    geometry: unit.geometry.clone(),
                    join,
                    ambiguous,
                });
            }
        }

        if !dataset.unjoined.is_empty() {
            warn!("{} ward metrics have no geometry", dataset.unjoined.len());
        }
        log_operation_complete("Fused", "rows", dataset.rows.len(), Some(start.elapsed()));
        dataset
    }
}
