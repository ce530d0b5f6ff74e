//! Configuration for fusion runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FusionError, Result};
use crate::models::{FacilityFilter, Stratum};

/// Configuration for one fusion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Which facilities contribute to ward metrics
    pub facility_filter: FacilityFilter,
    /// Demographic stratum to aggregate
    pub stratum: Stratum,
    /// Minimum composite similarity (0-100) for a fuzzy match
    pub fuzzy_threshold: u8,
    /// Whether enumerated sibling names are matched by ordinal
    pub ordinal_disambiguation: bool,
    /// Minimum composite similarity (0-100) backing a phonetic key collision
    pub phonetic_min_similarity: u8,
    /// Whether a ward unmatched inside its resolved LGA is searched state-wide
    pub state_wide_fallback: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            facility_filter: FacilityFilter::All,
            stratum: Stratum::Under5,
            fuzzy_threshold: 80,
            ordinal_disambiguation: true,
            phonetic_min_similarity: 75,
            state_wide_fallback: false,
        }
    }
}

impl FusionConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value is out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds are percentages
    ///
    /// # Errors
    /// Returns [`FusionError::Config`] naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_threshold > 100 {
            return Err(FusionError::Config(format!(
                "fuzzy_threshold must be 0-100, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.phonetic_min_similarity > 100 {
            return Err(FusionError::Config(format!(
                "phonetic_min_similarity must be 0-100, got {}",
                self.phonetic_min_similarity
            )));
        }
        Ok(())
    }

    /// Set the facility filter
    #[must_use]
    pub fn with_facility_filter(mut self, filter: FacilityFilter) -> Self {
        self.facility_filter = filter;
        self
    }

    /// Set the stratum
    #[must_use]
    pub fn with_stratum(mut self, stratum: Stratum) -> Self {
        self.stratum = stratum;
        self
    }

    /// Set the fuzzy threshold
    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: u8) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Enable or disable ordinal disambiguation
    #[must_use]
    pub fn with_ordinal_disambiguation(mut self, enabled: bool) -> Self {
        self.ordinal_disambiguation = enabled;
        self
    }

    /// Enable or disable the state-wide ward fallback
    #[must_use]
    pub fn with_state_wide_fallback(mut self, enabled: bool) -> Self {
        self.state_wide_fallback = enabled;
        self
    }
}

impl fmt::Display for FusionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fusion Configuration:")?;
        writeln!(f, "  Facility Filter: {}", self.facility_filter)?;
        writeln!(f, "  Stratum: {}", self.stratum)?;
        writeln!(f, "  Fuzzy Threshold: {}", self.fuzzy_threshold)?;
        writeln!(f, "  Ordinal Disambiguation: {}", self.ordinal_disambiguation)?;
        writeln!(f, "  Phonetic Min Similarity: {}", self.phonetic_min_similarity)?;
        writeln!(f, "  State-wide Fallback: {}", self.state_wide_fallback)?;
        Ok(())
    }
}
