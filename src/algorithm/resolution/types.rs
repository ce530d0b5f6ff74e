//! Core types for identity resolution

use serde::Serialize;
use std::fmt;

use crate::models::RawRecord;

/// Confidence of an exact match
pub const EXACT_CONFIDENCE: f64 = 100.0;
/// Confidence of a separator-normalized match
pub const NORMALIZED_CONFIDENCE: f64 = 95.0;
/// Highest confidence a phonetic match can carry
pub const PHONETIC_CONFIDENCE_CAP: f64 = 90.0;
/// Highest confidence an ordinal-disambiguated match can carry
pub const ORDINAL_CONFIDENCE_CAP: f64 = 90.0;

/// How a raw name was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    /// Case-insensitive equality of cleaned names
    Exact,
    /// Equality of separator-normalized keys
    Normalized,
    /// Phonetic key collision backed by string similarity
    Phonetic,
    /// Composite string similarity above the threshold
    Fuzzy,
    /// Exact ordinal match among enumerated siblings
    OrdinalDisambiguated,
    /// No acceptable candidate
    Unmatched,
}

impl Technique {
    /// Every technique in stage order
    pub const ALL: [Self; 6] = [
        Self::Exact,
        Self::Normalized,
        Self::Phonetic,
        Self::Fuzzy,
        Self::OrdinalDisambiguated,
        Self::Unmatched,
    ];

    /// Convert `Technique` to static string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Normalized => "normalized",
            Self::Phonetic => "phonetic",
            Self::Fuzzy => "fuzzy",
            Self::OrdinalDisambiguated => "ordinal-disambiguated",
            Self::Unmatched => "unmatched",
        }
    }

    /// Whether the technique produced a match
    #[must_use]
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule that settled a tie between equally scored candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The same raw name resolved to this unit earlier in the run
    PriorResolution,
    /// Only one tied candidate lies in the resolved LGA
    SameLga,
    /// Lexicographically smallest id; the result is low-confidence
    LowestId,
}

/// A distinct raw location as reported
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResolutionKey {
    /// Raw state name
    pub state: Option<String>,
    /// Raw LGA name
    pub lga: Option<String>,
    /// Raw ward name
    pub ward: Option<String>,
}

impl ResolutionKey {
    /// Create a key from raw names
    #[must_use]
    pub fn new(state: Option<&str>, lga: Option<&str>, ward: Option<&str>) -> Self {
        Self {
            state: state.map(str::to_string),
            lga: lga.map(str::to_string),
            ward: ward.map(str::to_string),
        }
    }

    /// The key of a raw record
    #[must_use]
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            state: record.state.clone(),
            lga: record.lga.clone(),
            ward: record.ward.clone(),
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |value: &Option<String>| value.clone().unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} / {} / {}",
            part(&self.state),
            part(&self.lga),
            part(&self.ward)
        )
    }
}

/// A candidate considered for a raw name and its composite score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    /// Unit id (or LGA name when resolving an LGA)
    pub id: String,
    /// Candidate name as it appears in the registry
    pub name: String,
    /// Composite similarity to the raw name, 0-100
    pub score: f64,
}

/// Outcome of matching one raw name against a candidate set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameMatch {
    /// Raw name as reported
    pub raw: Option<String>,
    /// Matched candidate id
    pub id: Option<String>,
    /// Matched candidate name
    pub name: Option<String>,
    /// How it was matched
    pub technique: Technique,
    /// Confidence, 0-100
    pub confidence: f64,
    /// Tie-break rule applied, if any
    pub tie_break: Option<TieBreak>,
    /// Candidate ids tied before the tie-break
    pub tied: Vec<String>,
    /// Candidates sorted by descending score
    pub candidates: Vec<CandidateScore>,
}

impl NameMatch {
    /// A non-match for a raw name
    #[must_use]
    pub fn unmatched(raw: Option<&str>, candidates: Vec<CandidateScore>) -> Self {
        Self {
            raw: raw.map(str::to_string),
            id: None,
            name: None,
            technique: Technique::Unmatched,
            confidence: 0.0,
            tie_break: None,
            tied: Vec::new(),
            candidates,
        }
    }

    /// Whether a candidate was accepted
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the choice fell to the lowest id among tied candidates
    #[must_use]
    pub fn is_tied(&self) -> bool {
        self.tie_break == Some(TieBreak::LowestId)
    }
}

/// Canonical names of a resolved unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalName {
    /// State name
    pub state: String,
    /// LGA name
    pub lga: Option<String>,
    /// Ward name
    pub ward: String,
}

/// Resolution of one distinct raw location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The raw location
    pub key: ResolutionKey,
    /// Resolved unit; `None` when unmatched
    pub unit_id: Option<String>,
    /// Canonical names of the resolved unit
    pub canonical: Option<CanonicalName>,
    /// Technique of the ward match
    pub technique: Technique,
    /// Confidence of the ward match, 0-100
    pub confidence: f64,
    /// How the state was resolved
    pub state: Option<NameMatch>,
    /// How the LGA was resolved
    pub lga: Option<NameMatch>,
    /// Ward candidates sorted by descending score
    pub candidates: Vec<CandidateScore>,
    /// Tie-break rule applied to the ward, if any
    pub tie_break: Option<TieBreak>,
    /// Unit ids tied before the tie-break
    pub tied: Vec<String>,
    /// Whether the result needs review
    pub low_confidence: bool,
    /// Resolution notes (fallbacks taken, why a name stayed unmatched)
    pub notes: Vec<String>,
}

impl MatchResult {
    /// Whether the key resolved to a unit
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.unit_id.is_some()
    }
}
