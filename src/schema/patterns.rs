//! Metric column vocabulary
//!
//! Metric headers vary widely between exports (`Persons tested RDT <5yrs`,
//! `u5_rdt_pos`, `Malaria confirmed by microscopy - Pregnant women`). A
//! header is a metric column when it names a measure (tested or positive)
//! and a stratum; the test method is optional.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Measure, MetricSpec, Stratum, TestMethod};
use crate::utils::arrow::normalize_header;

lazy_static! {
    static ref PREGNANT: Regex = Regex::new(r"\b(pregnan\w*|pw|anc)\b").unwrap();
    static ref UNDER5: Regex = Regex::new(
        r"(<\s*5|\bu5\b|\bu-5\b|under\s*-?\s*(5|five)|0\s*-\s*59\s*m|less\s+than\s+(5|five)|\bbelow\s+(5|five)\b)"
    )
    .unwrap();
    static ref OVER5: Regex = Regex::new(
        r"(>=?\s*5|≥\s*5|\bo5\b|over\s*-?\s*(5|five)|above\s+(5|five)|(5|five)\s*(years?\s+)?(and|&)\s+(above|older|over)|\b5\s*\+)"
    )
    .unwrap();
    static ref POSITIVE: Regex =
        Regex::new(r"\b(positive|positives|pos|confirmed|cases)\b").unwrap();
    static ref TESTED: Regex =
        Regex::new(r"\b(tested|test|tests|examined|done|performed)\b").unwrap();
    static ref RDT: Regex = Regex::new(r"\brdts?\b").unwrap();
    static ref MICROSCOPY: Regex = Regex::new(r"\b(microscopy|micro|slides?|smears?)\b").unwrap();
    static ref PCR: Regex = Regex::new(r"\bpcr\b").unwrap();
    static ref ID_LIKE: Regex =
        Regex::new(r"(\bid\b|\buid\b|code\b|(unit|org|orgunit|ward|lga|state|facility|hf)id\b)")
            .unwrap();
}

/// Classify a metric header
///
/// Positive wins over tested when both appear (`tested positive`). The
/// pregnant stratum wins over the age bands, and under-five over over-five.
/// Returns `None` for headers that name no measure or no stratum.
#[must_use]
pub fn classify_metric(header: &str) -> Option<MetricSpec> {
    let normalized = normalize_header(header);

    let measure = if POSITIVE.is_match(&normalized) {
        Measure::Positive
    } else if TESTED.is_match(&normalized) {
        Measure::Tested
    } else {
        return None;
    };

    let stratum = if PREGNANT.is_match(&normalized) {
        Stratum::Pregnant
    } else if UNDER5.is_match(&normalized) {
        Stratum::Under5
    } else if OVER5.is_match(&normalized) {
        Stratum::Over5
    } else {
        return None;
    };

    let method = if RDT.is_match(&normalized) {
        TestMethod::Rdt
    } else if MICROSCOPY.is_match(&normalized) {
        TestMethod::Microscopy
    } else if PCR.is_match(&normalized) {
        TestMethod::Pcr
    } else {
        TestMethod::Unspecified
    };

    Some(MetricSpec {
        measure,
        method,
        stratum,
    })
}

/// Whether a header looks like an identifier or code column
///
/// Such columns are never location candidates (`wardcode`, `orgunit_id`).
#[must_use]
pub fn is_id_like(header: &str) -> bool {
    let normalized = normalize_header(header);
    ID_LIKE.is_match(&normalized)
}

/// Location role a header names explicitly, if any
#[must_use]
pub fn location_hint(header: &str) -> Option<LocationHint> {
    let compact = crate::utils::arrow::compact_header(header);
    let normalized = normalize_header(header);
    if compact.starts_with("state") {
        Some(LocationHint::State)
    } else if compact.starts_with("lga") || normalized.contains("local government") {
        Some(LocationHint::Lga)
    } else if compact.starts_with("ward") {
        Some(LocationHint::Ward)
    } else if compact.starts_with("facility")
        || compact.starts_with("healthfacility")
        || compact == "hf"
        || compact.starts_with("hfname")
    {
        Some(LocationHint::Facility)
    } else {
        None
    }
}

/// Header hint for a location role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationHint {
    /// State column
    State,
    /// LGA column
    Lga,
    /// Ward column
    Ward,
    /// Facility column
    Facility,
}

/// Whether a header names a facility category column
#[must_use]
pub fn is_category_header(header: &str) -> bool {
    let compact = crate::utils::arrow::compact_header(header);
    matches!(
        compact.as_str(),
        "category" | "facilitycategory" | "facilitytype" | "facilitylevel" | "level" | "ftype"
    )
}

/// Whether a header names a reporting period
#[must_use]
pub fn is_period_header(header: &str) -> bool {
    let compact = crate::utils::arrow::compact_header(header);
    matches!(
        compact.as_str(),
        "period" | "periodname" | "month" | "date" | "reportingperiod" | "periodid" | "yearmonth"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(measure: Measure, method: TestMethod, stratum: Stratum) -> Option<MetricSpec> {
        Some(MetricSpec {
            measure,
            method,
            stratum,
        })
    }

    #[test]
    fn test_common_headers() {
        assert_eq!(
            classify_metric("Persons tested RDT <5yrs"),
            spec(Measure::Tested, TestMethod::Rdt, Stratum::Under5)
        );
        assert_eq!(
            classify_metric("u5_rdt_pos"),
            spec(Measure::Positive, TestMethod::Rdt, Stratum::Under5)
        );
        assert_eq!(
            classify_metric("Persons tested positive by Microscopy >=5yrs"),
            spec(Measure::Positive, TestMethod::Microscopy, Stratum::Over5)
        );
        assert_eq!(
            classify_metric("Malaria confirmed - Pregnant women"),
            spec(Measure::Positive, TestMethod::Unspecified, Stratum::Pregnant)
        );
        assert_eq!(
            classify_metric("Tested 5 years and above"),
            spec(Measure::Tested, TestMethod::Unspecified, Stratum::Over5)
        );
        assert_eq!(
            classify_metric("Slides examined under five"),
            spec(Measure::Tested, TestMethod::Microscopy, Stratum::Under5)
        );
    }

    #[test]
    fn test_non_metric_headers() {
        assert_eq!(classify_metric("WardName"), None);
        assert_eq!(classify_metric("periodname"), None);
        // a measure without a stratum is not a metric column
        assert_eq!(classify_metric("total tested"), None);
    }

    #[test]
    fn test_hints() {
        assert_eq!(location_hint("State"), Some(LocationHint::State));
        assert_eq!(location_hint("LGA_name"), Some(LocationHint::Lga));
        assert_eq!(location_hint("wardname"), Some(LocationHint::Ward));
        assert_eq!(location_hint("HF"), Some(LocationHint::Facility));
        // DHIS2 level columns are ordered by cardinality instead
        assert_eq!(location_hint("orgunitlevel4"), None);
        assert_eq!(location_hint("zone"), None);
        assert!(is_id_like("wardcode"));
        assert!(is_id_like("orgunit_id"));
        assert!(!is_id_like("Ward"));
        assert!(is_category_header("Facility_Type"));
        assert!(is_period_header("periodname"));
    }
}
