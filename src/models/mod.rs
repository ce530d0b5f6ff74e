//! Domain models for the fusion engine
//!
//! Raw records extracted from uploads, the metric vocabulary, facility
//! categories and the authoritative boundary registry.

pub mod admin_unit;
pub mod facility;
pub mod metric;
pub mod record;

pub use admin_unit::{BoundaryRegistry, CanonicalAdminUnit, unit_identity};
pub use facility::{CategorySource, FacilityCategory, FacilityFilter, classify_facility};
pub use metric::{Measure, MetricSpec, Stratum, TestMethod};
pub use record::{Observation, RawRecord};
