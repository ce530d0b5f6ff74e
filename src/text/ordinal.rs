//! Enumerator parsing for numbered and lettered administrative units
//!
//! Sibling wards are commonly distinguished only by a trailing enumerator, and
//! different systems write the same sibling as `Gwale 2`, `Gwale II` or
//! `Gwale B`. Parsing converts every form to a canonical ordinal so siblings
//! can be compared exactly instead of by string similarity.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::text::admin_name::match_key;

lazy_static! {
    // Roman numerals written with i, v and x only (1-39)
    static ref ROMAN: Regex = Regex::new(r"^x{0,3}(ix|iv|v?i{0,3})$").unwrap();
    static ref ATTACHED_NUMBER: Regex = Regex::new(r"^([a-z]+?)(\d{1,3})$").unwrap();
}

/// Alphabet an enumerator was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumeratorKind {
    /// `1`, `2`, `3`
    Arabic,
    /// `ii`, `iii`, `iv` (multi-character Roman numerals)
    Roman,
    /// `a`, `b`, `c`
    Letter,
    /// `i`, `v`, `x`: a Roman numeral or a letter depending on the siblings
    RomanOrLetter,
}

/// A parsed trailing enumerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumerator {
    /// Alphabet of the enumerator
    pub kind: EnumeratorKind,
    /// The enumerator as written (lowercase)
    pub token: String,
    /// Numeric value (Arabic/Roman value, or letter position for letters)
    pub value: u32,
    /// Letter position when the token is also a plausible letter
    pub letter: Option<u32>,
}

impl Enumerator {
    /// Canonical ordinal of this enumerator
    ///
    /// `roman_context` says whether the sibling set is Roman-numbered; it only
    /// matters for the ambiguous single letters `i`, `v` and `x`.
    #[must_use]
    pub fn ordinal(&self, roman_context: bool) -> u32 {
        match (self.kind, self.letter) {
            (EnumeratorKind::RomanOrLetter, Some(letter)) if !roman_context => letter,
            _ => self.value,
        }
    }
}

/// A name split into a stem and a trailing enumerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumerated {
    /// Match key of the stem (`"gwale"` for `"Gwale II"`)
    pub stem: String,
    /// The enumerator
    pub enumerator: Enumerator,
}

fn roman_value(token: &str) -> u32 {
    let digit = |c: char| match c {
        'i' => 1,
        'v' => 5,
        'x' => 10,
        _ => 0,
    };
    let values: Vec<u32> = token.chars().map(digit).collect();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| match values.get(i + 1) {
            Some(&next) if next > v => -(v as i64),
            _ => v as i64,
        })
        .sum::<i64>()
        .max(0) as u32
}

fn letter_position(c: char) -> u32 {
    u32::from(c) - u32::from('a') + 1
}

/// Parse a single enumerator token (lowercase, no punctuation)
fn parse_token(token: &str) -> Option<Enumerator> {
    if token.is_empty() {
        return None;
    }

    if token.chars().all(|c| c.is_ascii_digit()) {
        let value: u32 = token.parse().ok()?;
        return (1..=999).contains(&value).then(|| Enumerator {
            kind: EnumeratorKind::Arabic,
            token: token.to_string(),
            value,
            letter: None,
        });
    }

    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_ascii_lowercase() {
            return None;
        }
        return Some(if matches!(c, 'i' | 'v' | 'x') {
            Enumerator {
                kind: EnumeratorKind::RomanOrLetter,
                token: token.to_string(),
                value: roman_value(token),
                letter: Some(letter_position(c)),
            }
        } else {
            Enumerator {
                kind: EnumeratorKind::Letter,
                token: token.to_string(),
                value: letter_position(c),
                letter: None,
            }
        });
    }

    ROMAN.is_match(token).then(|| Enumerator {
        kind: EnumeratorKind::Roman,
        token: token.to_string(),
        value: roman_value(token),
        letter: None,
    })
}

/// Split a name into stem and trailing enumerator
///
/// Recognizes `Stem 2`, `Stem II`, `Stem B`, `Stem (II)`, `Stem 'B'`,
/// `Stem No. 2` and `Stem2`. Returns `None` when the name has no enumerator or
/// when nothing would be left of the stem.
#[must_use]
pub fn parse_enumerated(name: &str) -> Option<Enumerated> {
    let lowered = name.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() == 1 {
        let caps = ATTACHED_NUMBER.captures(tokens[0])?;
        let enumerator = parse_token(caps.get(2)?.as_str())?;
        return Some(Enumerated {
            stem: match_key(caps.get(1)?.as_str()),
            enumerator,
        });
    }

    let last = tokens.pop()?;
    let enumerator = parse_token(last)?;
    if tokens.last() == Some(&"no") {
        tokens.pop();
    }
    if tokens.is_empty() {
        return None;
    }

    Some(Enumerated {
        stem: match_key(&tokens.join(" ")),
        enumerator,
    })
}
