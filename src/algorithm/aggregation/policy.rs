//! Aggregation policy and the per-record method choice

use serde::Serialize;
use std::fmt;

use crate::config::FusionConfig;
use crate::models::{FacilityFilter, Measure, RawRecord, Stratum, TestMethod};

/// Which records are aggregated, and for which stratum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct AggregationPolicy {
    /// Facilities admitted to ward metrics
    pub facility_filter: FacilityFilter,
    /// Stratum whose counts are pooled
    pub stratum: Stratum,
}

impl AggregationPolicy {
    /// Create a policy
    #[must_use]
    pub fn new(facility_filter: FacilityFilter, stratum: Stratum) -> Self {
        Self {
            facility_filter,
            stratum,
        }
    }
}

impl From<&FusionConfig> for AggregationPolicy {
    fn from(config: &FusionConfig) -> Self {
        Self::new(config.facility_filter, config.stratum)
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facilities, {}", self.facility_filter, self.stratum)
    }
}

/// Counts one facility record contributes to its ward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MethodChoice {
    /// The method with the highest positivity, with its own counts
    Selected {
        /// Chosen method
        method: TestMethod,
        /// Persons tested by that method
        tested: f64,
        /// Positives by that method
        positive: f64,
        /// Positives reported under methods with no tests, left out of the counts
        untested_positive: f64,
    },
    /// Observations exist but no method reports a test
    NoTests {
        /// Positives reported without tests, summed over methods
        positive: f64,
    },
    /// Nothing reported for the stratum
    NoData,
}

/// Choose the counts a record contributes for a stratum
///
/// Each method's rate is computed on its own and the method with the highest
/// rate contributes its tested/positive pair. Methods are never summed or
/// averaged. Equal rates go to the method listed first (RDT, microscopy,
/// PCR, unspecified).
#[must_use]
pub fn choose_method(record: &RawRecord, stratum: Stratum) -> MethodChoice {
    let methods = record.methods_for(stratum);
    if methods.is_empty() {
        return MethodChoice::NoData;
    }

    let mut best: Option<(TestMethod, f64, f64, f64)> = None;
    let mut untested_positive = 0.0;
    for method in methods {
        let tested = record
            .value(Measure::Tested, method, stratum)
            .unwrap_or(0.0);
        let positive = record
            .value(Measure::Positive, method, stratum)
            .unwrap_or(0.0);
        if tested <= 0.0 {
            untested_positive += positive;
            continue;
        }
        let rate = positive / tested;
        if best.is_none_or(|(_, _, _, best_rate)| rate > best_rate) {
            best = Some((method, tested, positive, rate));
        }
    }

    match best {
        Some((method, tested, positive, _)) => MethodChoice::Selected {
            method,
            tested,
            positive,
            untested_positive,
        },
        None => MethodChoice::NoTests {
            positive: untested_positive,
        },
    }
}
