//! Algorithm implementations for the fusion pipeline
//!
//! This module contains the three stages that follow schema detection:
//! identity resolution of raw location names, aggregation of facility
//! records into ward metrics, and fusion of ward metrics with registry
//! geometry.

pub mod aggregation;
pub mod fusion;
pub mod resolution;
