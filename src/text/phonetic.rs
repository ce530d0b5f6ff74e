//! Phonetic keys for administrative names
//!
//! A compact Metaphone-style encoding applied token by token. Numeric tokens
//! are kept verbatim (without leading zeros) so that enumerated siblings such
//! as `Gwale 1` and `Gwale 2` never collide.

use itertools::Itertools;

/// Fold common Latin accented letters to ASCII
fn fold(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ç' | 'Ç' => 'C',
        'ñ' | 'Ñ' => 'N',
        'ƙ' | 'Ƙ' => 'K',
        'ɗ' | 'Ɗ' => 'D',
        'ɓ' | 'Ɓ' => 'B',
        c if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
        _ => return None,
    };
    Some(folded)
}

fn is_vowel(c: Option<char>) -> bool {
    matches!(c, Some('A' | 'E' | 'I' | 'O' | 'U'))
}

fn is_front_vowel(c: Option<char>) -> bool {
    matches!(c, Some('E' | 'I' | 'Y'))
}

/// Encode one alphabetic token
fn encode_token(token: &str) -> String {
    let mut letters: Vec<char> = token.chars().filter_map(fold).collect();
    if letters.is_empty() {
        return String::new();
    }

    // Silent or shifted initial clusters
    match (letters.first().copied(), letters.get(1).copied()) {
        (Some('K' | 'G' | 'P'), Some('N')) | (Some('W'), Some('R')) => {
            letters.remove(0);
        }
        (Some('W'), Some('H')) => {
            letters.remove(1);
        }
        (Some('X'), _) => letters[0] = 'S',
        _ => {}
    }

    let at = |i: usize| letters.get(i).copied();
    let mut codes: Vec<char> = Vec::with_capacity(letters.len());

    let mut i = 0;
    while i < letters.len() {
        let c = letters[i];
        let prev = if i == 0 { None } else { at(i - 1) };
        let next = at(i + 1);

        if prev == Some(c) && c != 'C' {
            i += 1;
            continue;
        }

        match c {
            'A' | 'E' | 'I' | 'O' | 'U' => {
                if i == 0 {
                    codes.push(c);
                }
            }
            'B' => {
                if !(prev == Some('M') && next.is_none()) {
                    codes.push('B');
                }
            }
            'C' => {
                if next == Some('H') {
                    codes.push('X');
                    i += 1;
                } else if is_front_vowel(next) {
                    codes.push('S');
                } else if prev != Some('S') || next.is_some() {
                    codes.push('K');
                }
            }
            'D' => {
                if next == Some('G') && is_front_vowel(at(i + 2)) {
                    codes.push('J');
                    i += 1;
                } else {
                    codes.push('T');
                }
            }
            'G' => {
                if next == Some('H') && !is_vowel(at(i + 2)) {
                    i += 1;
                } else if is_front_vowel(next) {
                    codes.push('J');
                } else {
                    codes.push('K');
                }
            }
            'H' => {
                let after_modifier = matches!(prev, Some('C' | 'S' | 'P' | 'T' | 'G'));
                if is_vowel(next) && !after_modifier {
                    codes.push('H');
                }
            }
            'K' => {
                if prev != Some('C') {
                    codes.push('K');
                }
            }
            'P' => {
                if next == Some('H') {
                    codes.push('F');
                    i += 1;
                } else {
                    codes.push('P');
                }
            }
            'Q' => codes.push('K'),
            'S' => {
                if next == Some('H') {
                    codes.push('X');
                    i += 1;
                } else {
                    codes.push('S');
                }
            }
            'T' => {
                if next == Some('H') {
                    codes.push('0');
                    i += 1;
                } else {
                    codes.push('T');
                }
            }
            'V' => codes.push('F'),
            'W' | 'Y' => {
                if is_vowel(next) {
                    codes.push(c);
                }
            }
            'X' => {
                codes.push('K');
                codes.push('S');
            }
            'Z' => codes.push('S'),
            other => codes.push(other),
        }
        i += 1;
    }

    codes.into_iter().dedup().collect()
}

/// Phonetic key of a name
///
/// Tokens are split on anything that is not alphanumeric. Purely numeric
/// tokens are preserved as numbers; other tokens are encoded. Returns an empty
/// string when nothing encodable remains.
#[must_use]
pub fn phonetic_key(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.chars().all(|c| c.is_ascii_digit()) {
                let trimmed = token.trim_start_matches('0');
                if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
            } else {
                encode_token(token)
            }
        })
        .filter(|code| !code.is_empty())
        .join(" ")
}
