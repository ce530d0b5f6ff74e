//! Facility categories and the keyword classifier used when no explicit
//! category is reported

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref TERTIARY: Regex = Regex::new(
        r"(?i)\b(teaching\s+hospital|university|federal\s+medical\s+cent(re|er)|fmc|specialist\s+hospital|national\s+hospital|tertiary)\b"
    )
    .unwrap();
    static ref SECONDARY: Regex = Regex::new(
        r"(?i)\b(general\s+hospital|cottage\s+hospital|district\s+hospital|state\s+hospital|comprehensive\s+health\s+cent(re|er)|secondary|hospital)\b"
    )
    .unwrap();
    static ref PRIMARY: Regex = Regex::new(
        r"(?i)\b(phc|phcc|primary\s+health|health\s+cent(re|er)|health\s+post|health\s+clinic|clinic|dispensary|maternity|mch|primary)\b"
    )
    .unwrap();
}

/// Level of care of a health facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityCategory {
    /// Primary care (health posts, clinics, PHCs)
    Primary,
    /// Secondary care (general hospitals)
    Secondary,
    /// Tertiary care (teaching and specialist hospitals)
    Tertiary,
    /// No facility name or category was available
    Unknown,
}

impl fmt::Display for FacilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

impl FacilityCategory {
    /// Parse an explicit category label from a source column
    ///
    /// Accepts the usual spellings (`Primary`, `Secondary Health Facility`,
    /// `TERTIARY`) and returns `None` for anything else.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        if lowered.starts_with("primary") {
            Some(Self::Primary)
        } else if lowered.starts_with("secondary") {
            Some(Self::Secondary)
        } else if lowered.starts_with("tertiary") {
            Some(Self::Tertiary)
        } else {
            None
        }
    }
}

/// How a facility category was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Reported in a category column
    Explicit,
    /// Matched a keyword in the facility name
    Keyword,
    /// Named facility matching no keyword, or no name at all
    Default,
}

/// Classify a facility from its name
///
/// Precedence is tertiary keywords, then secondary, then primary; a named
/// facility matching none of them defaults to primary. A missing name is
/// `Unknown`.
#[must_use]
pub fn classify_facility(name: Option<&str>) -> (FacilityCategory, CategorySource) {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return (FacilityCategory::Unknown, CategorySource::Default);
    };

    if TERTIARY.is_match(name) {
        (FacilityCategory::Tertiary, CategorySource::Keyword)
    } else if SECONDARY.is_match(name) {
        (FacilityCategory::Secondary, CategorySource::Keyword)
    } else if PRIMARY.is_match(name) {
        (FacilityCategory::Primary, CategorySource::Keyword)
    } else {
        (FacilityCategory::Primary, CategorySource::Default)
    }
}

/// Which facilities contribute to aggregated metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacilityFilter {
    /// Primary facilities only
    Primary,
    /// Secondary facilities only
    Secondary,
    /// Tertiary facilities only
    Tertiary,
    /// Every facility
    #[default]
    All,
}

impl FacilityFilter {
    /// Whether a facility of this category passes the filter
    ///
    /// `Unknown` facilities are treated as primary, matching the classifier's
    /// default.
    #[must_use]
    pub fn admits(self, category: FacilityCategory) -> bool {
        match (self, category) {
            (Self::All, _) => true,
            (Self::Primary, FacilityCategory::Primary | FacilityCategory::Unknown) => true,
            (Self::Secondary, FacilityCategory::Secondary) => true,
            (Self::Tertiary, FacilityCategory::Tertiary) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FacilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::All => "all",
        };
        f.write_str(label)
    }
}

impl FromStr for FacilityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "tertiary" => Ok(Self::Tertiary),
            "all" => Ok(Self::All),
            other => Err(format!("Unknown facility filter: {other}")),
        }
    }
}
