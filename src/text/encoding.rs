//! Encoding detection and mojibake repair
//!
//! Spreadsheets exported from different reporting systems frequently arrive as
//! UTF-8 text that was decoded once (or twice) through a legacy single-byte
//! code page, producing sequences such as `Ã©` for `é`. Repair re-encodes the
//! text through each candidate code page and decodes the bytes as UTF-8 again,
//! keeping the result only when the corruption signature disappears.

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1250, WINDOWS_1252};
use itertools::Itertools;
use serde::Serialize;

/// Maximum number of repair passes (double-encoded text needs two)
const MAX_REPAIR_PASSES: usize = 3;

/// Characters windows-1252 places in the 0x80-0x9F range
const CP1252_HIGH: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Single-byte encodings tried when repairing, in order of prior likelihood
fn repair_candidates() -> [&'static Encoding; 3] {
    [WINDOWS_1252, ISO_8859_15, WINDOWS_1250]
}

/// Result of normalizing one text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedText {
    /// The normalized text
    pub text: String,
    /// Name of the encoding the text was repaired through, if any
    pub repaired_from: Option<&'static str>,
    /// Corruption was detected but could not be removed
    pub low_confidence: bool,
}

impl NormalizedText {
    /// Whether a repair changed the text
    #[must_use]
    pub fn was_repaired(&self) -> bool {
        self.repaired_from.is_some()
    }
}

/// Could this character be the first byte of a two-byte UTF-8 sequence read as Latin-1?
fn is_lead(c: char) -> bool {
    ('\u{00C2}'..='\u{00F4}').contains(&c)
}

/// Could this character be a UTF-8 continuation byte read as Latin-1 or windows-1252?
fn is_trail(c: char) -> bool {
    ('\u{0080}'..='\u{00BF}').contains(&c) || CP1252_HIGH.contains(c)
}

/// Count corruption signatures in a string
///
/// A signature is either a lead/continuation pair typical of UTF-8 decoded as a
/// single-byte code page, or a U+FFFD replacement character.
#[must_use]
pub fn mojibake_score(text: &str) -> usize {
    let pairs = text
        .chars()
        .tuple_windows()
        .filter(|&(a, b)| is_lead(a) && is_trail(b))
        .count();
    pairs + text.chars().filter(|&c| c == '\u{FFFD}').count()
}

/// Re-encode through the candidate code pages and keep the best UTF-8 decoding
fn repair_once(text: &str) -> Option<(String, &'static Encoding)> {
    let before = mojibake_score(text);
    if before == 0 {
        return None;
    }

    repair_candidates()
        .into_iter()
        .filter_map(|encoding| {
            let (bytes, _, unmappable) = encoding.encode(text);
            if unmappable {
                return None;
            }
            let decoded = UTF_8.decode_without_bom_handling_and_without_replacement(&bytes)?;
            let score = mojibake_score(&decoded);
            (score < before).then(|| (decoded.into_owned(), encoding, score))
        })
        .min_by_key(|(_, _, score)| *score)
        .map(|(text, encoding, _)| (text, encoding))
}

/// Repair passes; the result is accepted only when no signature remains
fn repair(text: &str) -> Option<(String, &'static Encoding)> {
    let mut current = text.to_string();
    let mut used = None;

    for _ in 0..MAX_REPAIR_PASSES {
        match repair_once(&current) {
            Some((fixed, encoding)) => {
                current = fixed;
                used.get_or_insert(encoding);
                if mojibake_score(&current) == 0 {
                    return used.map(|encoding| (current, encoding));
                }
            }
            None => break,
        }
    }

    None
}

/// Strip BOMs and control characters, unify spaces and trim
fn tidy(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter(|&c| c != '\u{FEFF}')
        .filter_map(|c| match c {
            '\t' | '\n' | '\r' => Some(' '),
            c if c.is_whitespace() => Some(' '),
            c if (c as u32) < 0x20 || c == '\u{7F}' => None,
            c => Some(c),
        })
        .collect();
    mapped.split(' ').filter(|part| !part.is_empty()).join(" ")
}

/// Normalize a text field
///
/// Repairs mojibake when the repair removes the corruption signature, then
/// tidies whitespace. The procedure is iterated to a fixed point, so
/// normalizing normalized text is a no-op.
#[must_use]
pub fn normalize(text: &str) -> NormalizedText {
    let mut current = text.to_string();
    let mut repaired_from = None;

    // A repair shrinks the UTF-8 length and tidying never grows it, so the
    // loop reaches a fixed point.
    loop {
        let repaired = match repair(&current) {
            Some((fixed, encoding)) => {
                repaired_from.get_or_insert(encoding.name());
                fixed
            }
            None => current.clone(),
        };
        let next = tidy(&repaired);
        if next == current {
            break;
        }
        current = next;
    }

    let low_confidence = mojibake_score(&current) > 0;
    NormalizedText {
        text: current,
        repaired_from,
        low_confidence,
    }
}

/// Decode raw bytes to text
///
/// Honors a byte-order mark, tries UTF-8 and falls back to windows-1252, which
/// is what spreadsheet tools most often write. Returns the text and the name
/// of the encoding that was used.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (decoded.into_owned(), encoding.name());
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), UTF_8.name()),
        Err(_) => {
            let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (decoded.into_owned(), WINDOWS_1252.name())
        }
    }
}
