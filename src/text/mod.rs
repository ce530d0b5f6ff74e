//! Text normalization for administrative names
//!
//! This module repairs corrupted encodings and cleans administrative names
//! before they reach the identity resolver. It includes:
//!
//! 1. Statistical mojibake detection and repair
//! 2. Administrative-name cleaning (suffixes, state-code prefixes, separators)
//! 3. Phonetic keys used by the phonetic matching stage
//! 4. Enumerator parsing (1/2/3, I/II/III, A/B/C) for ordinal disambiguation
//!
//! Every function here is pure and never panics on arbitrary input.

pub mod admin_name;
pub mod encoding;
pub mod ordinal;
pub mod phonetic;

pub use admin_name::{NameRole, clean_admin_name, match_key};
pub use encoding::{NormalizedText, decode_bytes, mojibake_score, normalize};
pub use ordinal::{Enumerated, Enumerator, EnumeratorKind, parse_enumerated};
pub use phonetic::phonetic_key;
