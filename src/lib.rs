//! A Rust library for fusing facility-level malaria test records with an
//! administrative boundary registry: schema detection, identity resolution of
//! messy location names, ward-level aggregation and geometry joins.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod text;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::FusionConfig;
pub use error::{FusionError, Result};
pub use pipeline::{FusionOutput, FusionPipeline};
pub use report::{Anomaly, DataQualityKind, FusionRun};

// Models
pub use models::{
    BoundaryRegistry, CanonicalAdminUnit, FacilityCategory, FacilityFilter, RawRecord, Stratum,
};

// Stages
pub use algorithm::aggregation::{AggregationPolicy, MetricAggregator, WardMetric};
pub use algorithm::fusion::{FusedDataset, GeometryFuser};
pub use algorithm::resolution::{IdentityResolver, MatchResult, ResolutionKey, Technique};
pub use schema::{SchemaDetector, SchemaRoles, detect_schema, extract_records};
pub use text::{NormalizedText, clean_admin_name, normalize};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Loading
pub use loader::{read_parquet, read_parquet_table, read_registry};
