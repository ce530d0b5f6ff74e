//! Metric vocabulary: what was measured, how, and for whom

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a count is of tests performed or of positive results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Persons tested
    Tested,
    /// Persons testing positive
    Positive,
}

/// Diagnostic test method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMethod {
    /// Rapid diagnostic test
    Rdt,
    /// Microscopy (blood smear)
    Microscopy,
    /// Polymerase chain reaction
    Pcr,
    /// The column does not name a method
    Unspecified,
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rdt => "rdt",
            Self::Microscopy => "microscopy",
            Self::Pcr => "pcr",
            Self::Unspecified => "unspecified",
        };
        f.write_str(label)
    }
}

/// Demographic stratum
///
/// Strata may overlap (a pregnant woman is also over five), so there is no
/// combined stratum: summing strata would double-count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stratum {
    /// Children under five years
    #[default]
    Under5,
    /// Persons five years and older
    Over5,
    /// Pregnant women
    Pregnant,
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Under5 => "under5",
            Self::Over5 => "over5",
            Self::Pregnant => "pregnant",
        };
        f.write_str(label)
    }
}

impl FromStr for Stratum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "under5" | "u5" => Ok(Self::Under5),
            "over5" | "o5" => Ok(Self::Over5),
            "pregnant" | "pw" => Ok(Self::Pregnant),
            other => Err(format!("Unknown stratum: {other}")),
        }
    }
}

/// What a metric column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Tested or positive
    pub measure: Measure,
    /// Test method
    pub method: TestMethod,
    /// Demographic stratum
    pub stratum: Stratum,
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let measure = match self.measure {
            Measure::Tested => "tested",
            Measure::Positive => "positive",
        };
        write!(f, "{measure}/{}/{}", self.method, self.stratum)
    }
}
