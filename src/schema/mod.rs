//! Schema detection for uploaded tables
//!
//! Uploads come from different reporting systems with arbitrary column names.
//! This module decides which column plays which role (location hierarchy,
//! metric, period, facility category) from header patterns and cell values,
//! and extracts [`RawRecord`](crate::models::RawRecord)s once roles are known.

pub mod detect;
pub mod extract;
pub mod patterns;
pub mod period;

use serde::Serialize;
use std::fmt;

use crate::models::MetricSpec;

pub use detect::{SchemaDetector, detect_schema};
pub use extract::{Extraction, extract_records};
pub use patterns::classify_metric;
pub use period::{PERIOD_SAMPLE_SIZE, ReportingPeriod};

/// Role a column can play in an uploaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    /// State name
    State,
    /// LGA name
    Lga,
    /// Ward name
    Ward,
    /// Facility name
    Facility,
    /// Tested or positive count
    Metric,
    /// Reporting period
    Period,
    /// Facility category
    Category,
}

impl ColumnRole {
    /// Location roles from the top of the hierarchy down
    pub const HIERARCHY: [Self; 4] = [Self::State, Self::Lga, Self::Ward, Self::Facility];

    /// Convert `ColumnRole` to static string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Lga => "lga",
            Self::Ward => "ward",
            Self::Facility => "facility",
            Self::Metric => "metric",
            Self::Period => "period",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column picked for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    /// Header as it appears in the table
    pub name: String,
    /// Position in the table
    pub index: usize,
}

/// A location column and how it was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationColumn {
    /// Header as it appears in the table
    pub name: String,
    /// Position in the table
    pub index: usize,
    /// Number of distinct non-blank values
    pub distinct: usize,
    /// Whether the header named the role
    pub hinted: bool,
}

/// A metric column and what it measures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricColumn {
    /// Header as it appears in the table
    pub name: String,
    /// Position in the table
    pub index: usize,
    /// Measure, method and stratum
    pub spec: MetricSpec,
}

/// A parent/child location pair whose cardinalities contradict the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyWarning {
    /// Higher role
    pub parent: ColumnRole,
    /// Lower role
    pub child: ColumnRole,
    /// Column holding the higher role
    pub parent_column: String,
    /// Column holding the lower role
    pub child_column: String,
    /// Distinct values in the parent column
    pub parent_distinct: usize,
    /// Distinct values in the child column
    pub child_distinct: usize,
}

/// Column roles detected for one uploaded table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SchemaRoles {
    /// State column
    pub state: Option<LocationColumn>,
    /// LGA column
    pub lga: Option<LocationColumn>,
    /// Ward column
    pub ward: Option<LocationColumn>,
    /// Facility column
    pub facility: Option<LocationColumn>,
    /// Metric columns in table order
    pub metrics: Vec<MetricColumn>,
    /// Reporting period column
    pub period: Option<ColumnRef>,
    /// Explicit facility category column
    pub category: Option<ColumnRef>,
    /// Columns given no role
    pub unused: Vec<String>,
    /// Cardinality contradictions between location roles
    pub hierarchy_warnings: Vec<HierarchyWarning>,
}

impl SchemaRoles {
    /// Location column for a hierarchy role
    #[must_use]
    pub fn location(&self, role: ColumnRole) -> Option<&LocationColumn> {
        match role {
            ColumnRole::State => self.state.as_ref(),
            ColumnRole::Lga => self.lga.as_ref(),
            ColumnRole::Ward => self.ward.as_ref(),
            ColumnRole::Facility => self.facility.as_ref(),
            _ => None,
        }
    }

    /// Assigned location columns from the top of the hierarchy down
    #[must_use]
    pub fn locations(&self) -> Vec<(ColumnRole, &LocationColumn)> {
        ColumnRole::HIERARCHY
            .iter()
            .filter_map(|&role| self.location(role).map(|column| (role, column)))
            .collect()
    }

    /// Number of assigned location columns
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.locations().len()
    }
}
