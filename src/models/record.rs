//! Raw facility-period observations as extracted from an uploaded table

use serde::Serialize;
use smallvec::SmallVec;

use crate::models::facility::{CategorySource, FacilityCategory, classify_facility};
use crate::models::metric::{Measure, MetricSpec, Stratum, TestMethod};

/// One numeric cell of a metric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// What the column measures
    pub spec: MetricSpec,
    /// The reported value
    pub value: f64,
}

/// One facility-period row of an uploaded table
///
/// Immutable after extraction. Names are normalized text (encoding repaired,
/// whitespace tidied) but not yet cleaned; cleaning belongs to resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    /// Row index in the source table
    pub row: usize,
    /// State name as reported
    pub state: Option<String>,
    /// LGA name as reported
    pub lga: Option<String>,
    /// Ward name as reported
    pub ward: Option<String>,
    /// Facility name as reported
    pub facility: Option<String>,
    /// Reporting period, normalized (`2024-01`, `2024`, `2024-Q1`)
    pub period: Option<String>,
    /// Category from an explicit category column
    pub category: Option<FacilityCategory>,
    /// Non-null metric cells
    pub observations: SmallVec<[Observation; 8]>,
}

impl RawRecord {
    /// Facility category: explicit when reported, otherwise inferred from the name
    #[must_use]
    pub fn facility_category(&self) -> (FacilityCategory, CategorySource) {
        match self.category {
            Some(category) => (category, CategorySource::Explicit),
            None => classify_facility(self.facility.as_deref()),
        }
    }

    /// Sum of the values reported for one measure/method/stratum
    ///
    /// Returns `None` when no column carried a value for the combination.
    #[must_use]
    pub fn value(&self, measure: Measure, method: TestMethod, stratum: Stratum) -> Option<f64> {
        let spec = MetricSpec {
            measure,
            method,
            stratum,
        };
        self.observations
            .iter()
            .filter(|obs| obs.spec == spec)
            .map(|obs| obs.value)
            .reduce(|a, b| a + b)
    }

    /// Test methods with any observation in a stratum, in a stable order
    #[must_use]
    pub fn methods_for(&self, stratum: Stratum) -> SmallVec<[TestMethod; 4]> {
        let mut methods: SmallVec<[TestMethod; 4]> = self
            .observations
            .iter()
            .filter(|obs| obs.spec.stratum == stratum)
            .map(|obs| obs.spec.method)
            .collect();
        methods.sort_unstable();
        methods.dedup();
        methods
    }

    /// Key identifying the facility within a ward and period
    #[must_use]
    pub fn facility_key(&self) -> String {
        match &self.facility {
            Some(name) => name.to_lowercase(),
            None => format!("row:{}", self.row),
        }
    }
}
