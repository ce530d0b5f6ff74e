//! Utility functions shared across the engine

pub mod arrow;
pub mod logging;
