//! Administrative-name cleaning
//!
//! Reporting systems decorate unit names differently: DHIS2 exports prefix
//! names with a lowercase state code (`ad Yola North`), LGA names carry
//! "Local Government Area" in several abbreviations, and compound names use
//! hyphens, slashes or spaced dashes interchangeably.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic unit words dropped from separator-normalized match keys
const GENERIC_UNIT_WORDS: [&str; 2] = ["ward", "lga"];

lazy_static! {
    static ref LGA_SUFFIX: Regex = Regex::new(
        r"(?i)[\s,\-]*\b(local\s+gov(ernment|t\.?)?(\s+area)?|l\.\s*g\.\s*a\.?|lga)\s*$"
    )
    .unwrap();
    static ref STATE_SUFFIX: Regex = Regex::new(r"(?i)\s+state\s*$").unwrap();
    static ref STATE_CODE_PREFIX: Regex = Regex::new(r"^[a-z]{2}\s+(\S.*)$").unwrap();
    static ref SEPARATOR: Regex = Regex::new(r"\s*[-/\\–—]+\s*").unwrap();
}

/// The hierarchy level a name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameRole {
    /// State (top level)
    State,
    /// Local Government Area
    Lga,
    /// Ward
    Ward,
    /// Health facility
    Facility,
}

impl fmt::Display for NameRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::State => "state",
            Self::Lga => "lga",
            Self::Ward => "ward",
            Self::Facility => "facility",
        };
        f.write_str(label)
    }
}

/// Collapse runs of whitespace into single spaces and trim
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Clean an administrative name for matching and display
///
/// Strips a leading two-letter lowercase state code, the LGA suffix family
/// (for LGA and state names) or a trailing "State", collapses whitespace and
/// rewrites hyphen/slash separators to a single `-`. Never returns an empty
/// string for non-empty input: if stripping would consume the whole name, the
/// unstripped form is kept.
#[must_use]
pub fn clean_admin_name(name: &str, role: NameRole) -> String {
    let mut cleaned = collapse_whitespace(name);

    if let Some(caps) = STATE_CODE_PREFIX.captures(&cleaned) {
        cleaned = caps[1].to_string();
    }

    let stripped = match role {
        NameRole::Lga => LGA_SUFFIX.replace(&cleaned, "").into_owned(),
        NameRole::State => {
            let without_lga = LGA_SUFFIX.replace(&cleaned, "");
            STATE_SUFFIX.replace(&without_lga, "").into_owned()
        }
        NameRole::Ward | NameRole::Facility => cleaned.clone(),
    };
    if !stripped.trim().is_empty() {
        cleaned = stripped;
    }

    let separated = SEPARATOR.replace_all(&cleaned, "-");
    collapse_whitespace(separated.trim_matches('-'))
}

/// Separator-normalized comparison key
///
/// Lowercases, treats hyphen, slash, underscore and space identically, drops
/// punctuation and generic unit words. `"Jimeta Ward"` and `"jimeta"` share a
/// key, as do `"Gwale-Dala"` and `"Gwale / Dala"`.
#[must_use]
pub fn match_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let meaningful: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| !GENERIC_UNIT_WORDS.contains(token))
        .collect();

    if meaningful.is_empty() {
        tokens.join(" ")
    } else {
        meaningful.join(" ")
    }
}
