//! Run reporting
//!
//! Every run produces a [`FusionRun`]: counts, technique histograms, the
//! detected schema, registry collapses, the unresolved bucket and typed
//! anomalies. The report serializes to JSON for audit.

pub mod anomaly;
pub mod run;

pub use anomaly::{Anomaly, DataQualityKind};
pub use run::FusionRun;
