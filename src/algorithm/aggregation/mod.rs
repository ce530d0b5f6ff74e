//! Ward-level positivity aggregation
//!
//! Facility records are filtered by facility category, reduced to one
//! tested/positive pair per record (the highest-positivity test method), and
//! pooled per resolved ward and period. Records whose location did not
//! resolve are pooled separately by their raw names so that they still show
//! up in the report.

pub mod aggregator;
pub mod policy;

// Re-export key types
pub use aggregator::{AggregationOutput, MetricAggregator, UnresolvedGroup, WardMetric, aggregate};
pub use policy::{AggregationPolicy, MethodChoice, choose_method};
