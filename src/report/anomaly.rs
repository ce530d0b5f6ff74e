//! Non-fatal conditions found during a run
//!
//! Anomalies never abort a run. They accumulate in the report next to a
//! best-effort fused dataset, and each one carries the raw value that
//! triggered it.

use serde::Serialize;
use std::fmt;

use crate::algorithm::resolution::TieBreak;
use crate::schema::{ColumnRole, HierarchyWarning};

/// Data-quality conditions in reported counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQualityKind {
    /// More positives than tests in a pooled ward rate
    RateAbove100,
    /// A ward-period with no tests at all
    ZeroDenominator,
    /// A negative count cell, dropped on extraction
    NegativeCount,
    /// A facility record with positives but no tests
    PositiveWithoutTests,
}

impl DataQualityKind {
    /// Convert `DataQualityKind` to static string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateAbove100 => "rate_above_100",
            Self::ZeroDenominator => "zero_denominator",
            Self::NegativeCount => "negative_count",
            Self::PositiveWithoutTests => "positive_without_tests",
        }
    }
}

impl fmt::Display for DataQualityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition recorded in the run report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    /// A text cell whose corruption could not be repaired
    EncodingRepairLowConfidence {
        /// Column header
        column: String,
        /// First row carrying the value
        row: usize,
        /// The cell as read
        raw: String,
    },
    /// A raw location that resolved to no registry unit
    UnresolvedIdentity {
        /// Raw state name
        state: Option<String>,
        /// Raw LGA name
        lga: Option<String>,
        /// Raw ward name
        ward: Option<String>,
        /// Records sharing the location
        records: usize,
        /// Best-scoring candidate, if any was considered
        best_candidate: Option<String>,
        /// Score of the best candidate
        best_score: Option<f64>,
        /// Why nothing matched
        reason: Option<String>,
    },
    /// Registry features with the same (state, LGA, ward) identity
    DuplicateRegistryFeature {
        /// Unit id kept in the working copy
        kept: String,
        /// Unit ids dropped from the working copy
        dropped: Vec<String>,
        /// The shared identity
        identity: String,
        /// Whether the dropped geometries differ from the kept one
        geometry_differs: bool,
    },
    /// A ward metric joined to more than one geometry
    AmbiguousJoin {
        /// Resolved unit id of the metric
        unit_id: String,
        /// Ward name the join used
        ward: String,
        /// Unit ids whose geometries were retained
        candidates: Vec<String>,
    },
    /// A questionable count or rate
    DataQualityWarning {
        /// What is wrong
        kind: DataQualityKind,
        /// Resolved unit, for ward-level conditions
        unit_id: Option<String>,
        /// Reporting period
        period: Option<String>,
        /// Source row, for record-level conditions
        row: Option<usize>,
        /// The offending value as read or pooled
        raw: String,
    },
    /// Location columns whose cardinalities contradict the hierarchy
    HierarchyViolation {
        /// Higher role
        parent: ColumnRole,
        /// Lower role
        child: ColumnRole,
        /// Column holding the higher role
        parent_column: String,
        /// Column holding the lower role
        child_column: String,
        /// Distinct values in the parent column
        parent_distinct: usize,
        /// Distinct values in the child column
        child_distinct: usize,
    },
    /// Several candidates tied for a raw state, LGA or ward name
    TiedResolution {
        /// The raw location
        raw: String,
        /// Hierarchy level the tie was on
        level: ColumnRole,
        /// Tied unit ids, or tied state/LGA names
        candidates: Vec<String>,
        /// Candidate chosen
        chosen: String,
        /// Rule that decided
        rule: TieBreak,
    },
}

impl Anomaly {
    /// Short label of the anomaly type
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EncodingRepairLowConfidence { .. } => "encoding_repair_low_confidence",
            Self::UnresolvedIdentity { .. } => "unresolved_identity",
            Self::DuplicateRegistryFeature { .. } => "duplicate_registry_feature",
            Self::AmbiguousJoin { .. } => "ambiguous_join",
            Self::DataQualityWarning { .. } => "data_quality_warning",
            Self::HierarchyViolation { .. } => "hierarchy_violation",
            Self::TiedResolution { .. } => "tied_resolution",
        }
    }

    /// A data-quality warning about a ward-period
    #[must_use]
    pub fn ward_quality(
        kind: DataQualityKind,
        unit_id: &str,
        period: Option<&str>,
        raw: impl Into<String>,
    ) -> Self {
        Self::DataQualityWarning {
            kind,
            unit_id: Some(unit_id.to_string()),
            period: period.map(str::to_string),
            row: None,
            raw: raw.into(),
        }
    }

    /// A data-quality warning about one source row
    #[must_use]
    pub fn row_quality(kind: DataQualityKind, row: usize, raw: impl Into<String>) -> Self {
        Self::DataQualityWarning {
            kind,
            unit_id: None,
            period: None,
            row: Some(row),
            raw: raw.into(),
        }
    }
}

impl From<&HierarchyWarning> for Anomaly {
    fn from(warning: &HierarchyWarning) -> Self {
        Self::HierarchyViolation {
            parent: warning.parent,
            child: warning.child,
            parent_column: warning.parent_column.clone(),
            child_column: warning.child_column.clone(),
            parent_distinct: warning.parent_distinct,
            child_distinct: warning.child_distinct,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodingRepairLowConfidence { column, row, raw } => {
                write!(f, "unrepaired text in {column} row {row}: {raw:?}")
            }
            Self::UnresolvedIdentity {
                lga, ward, records, ..
            } => write!(
                f,
                "unresolved {} / {} ({records} records)",
                lga.as_deref().unwrap_or("?"),
                ward.as_deref().unwrap_or("?")
            ),
            Self::DuplicateRegistryFeature { kept, dropped, .. } => {
                write!(f, "registry duplicates of {kept}: {}", dropped.join(", "))
            }
            Self::AmbiguousJoin {
                unit_id,
                candidates,
                ..
            } => write!(f, "{unit_id} joined {} geometries", candidates.len()),
            Self::DataQualityWarning { kind, raw, .. } => write!(f, "{kind}: {raw}"),
            Self::HierarchyViolation {
                parent_column,
                child_column,
                ..
            } => write!(f, "{parent_column} does not nest in {child_column}"),
            Self::TiedResolution {
                raw,
                level,
                chosen,
                rule,
                ..
            } => write!(f, "{level} tie on {raw} settled by {rule:?} for {chosen}"),
        }
    }
}
