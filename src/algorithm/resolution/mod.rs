//! Identity resolution for administrative names
//!
//! This module resolves raw (state, LGA, ward) names reported by facilities
//! to units of the boundary registry. It includes:
//!
//! 1. Candidate preparation, done once per registry
//! 2. The staged matcher (exact, normalized, ordinal, phonetic, fuzzy)
//! 3. Hierarchical resolution with deterministic tie-breaking
//! 4. Per-run memoization of every distinct raw key
//!
//! Matching never crosses the resolved parent unit unless the state-wide
//! fallback is switched on, and every result records how it was reached.

pub mod cache;
pub mod candidates;
pub mod disambiguation;
pub mod resolver;
pub mod similarity;
pub mod stages;
pub mod types;

// Re-export key types
pub use cache::ResolutionCache;
pub use candidates::{CandidateIndex, PreparedName};
pub use disambiguation::{Disambiguation, disambiguate};
pub use resolver::{IdentityResolver, resolve};
pub use similarity::composite_score;
pub use stages::{StageOutcome, match_name};
pub use types::{
    CandidateScore, CanonicalName, MatchResult, NameMatch, ResolutionKey, Technique, TieBreak,
};
