//! Geometry fusion
//!
//! Each run works on its own deduplicated copy of the boundary registry and
//! joins ward metrics to it on the composite (state, LGA, ward) identity.

pub mod dedup;
pub mod fuser;

// Re-export key types
pub use dedup::{RegistryCollapse, deduplicate};
pub use fuser::{FusedDataset, FusedRow, GeometryFuser, JoinKind, UnjoinedWard};
