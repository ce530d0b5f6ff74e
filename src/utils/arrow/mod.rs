//! Arrow helpers shared by schema detection, extraction and the registry

pub mod array_utils;

pub use array_utils::{
    compact_header, find_column, float_column, float_value, normalize_header, string_column,
    string_value,
};
