//! Utilities for working with Arrow arrays.
//!
//! Uploaded tables arrive with arbitrary column types (a ward column may be
//! dictionary-encoded, a count column may be text). These helpers cast
//! columns to the type the engine needs and read cells without panicking on
//! nulls.

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{FusionError, Result};

/// Cast a column to `expected_type` unless it already has that type
fn cast_column(column: &ArrayRef, name: &str, expected_type: &DataType) -> Result<ArrayRef> {
    if column.data_type() == expected_type {
        return Ok(column.clone());
    }
    debug!(
        "Casting column '{name}' from {:?} to {expected_type:?}",
        column.data_type()
    );
    Ok(cast(column, expected_type)?)
}

/// Get a column as a string array
///
/// Any castable type is accepted; values that cannot be represented become
/// null.
///
/// # Errors
/// Returns an error if the column does not exist or cannot be cast to `Utf8`
pub fn string_column(batch: &RecordBatch, index: usize) -> Result<StringArray> {
    let schema = batch.schema();
    let field = schema.fields().get(index).ok_or_else(|| {
        FusionError::Arrow(arrow::error::ArrowError::SchemaError(format!(
            "Column index {index} out of range"
        )))
    })?;
    let cast = cast_column(batch.column(index), field.name(), &DataType::Utf8)?;
    cast.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| {
            FusionError::Arrow(arrow::error::ArrowError::CastError(format!(
                "Column '{}' is not a string column after cast",
                field.name()
            )))
        })
}

/// Get a column as a float array
///
/// Text cells that do not parse as numbers become null.
///
/// # Errors
/// Returns an error if the column does not exist or cannot be cast to `Float64`
pub fn float_column(batch: &RecordBatch, index: usize) -> Result<Float64Array> {
    let schema = batch.schema();
    let field = schema.fields().get(index).ok_or_else(|| {
        FusionError::Arrow(arrow::error::ArrowError::SchemaError(format!(
            "Column index {index} out of range"
        )))
    })?;
    let column = batch.column(index);
    let cast = match column.data_type() {
        // Trim text before parsing; exported spreadsheets pad numbers
        DataType::Utf8 | DataType::LargeUtf8 => {
            let strings = string_column(batch, index)?;
            let parsed: Float64Array = strings
                .iter()
                .map(|value| value.and_then(|v| v.trim().replace(',', "").parse::<f64>().ok()))
                .collect();
            return Ok(parsed);
        }
        _ => cast_column(column, field.name(), &DataType::Float64)?,
    };
    cast.as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| {
            FusionError::Arrow(arrow::error::ArrowError::CastError(format!(
                "Column '{}' is not numeric after cast",
                field.name()
            )))
        })
}

/// Non-empty string value at `row`, or `None` for nulls and blanks
#[must_use]
pub fn string_value(array: &StringArray, row: usize) -> Option<&str> {
    if array.is_null(row) {
        return None;
    }
    let value = array.value(row);
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Finite float value at `row`
#[must_use]
pub fn float_value(array: &Float64Array, row: usize) -> Option<f64> {
    if array.is_null(row) {
        return None;
    }
    let value = array.value(row);
    value.is_finite().then_some(value)
}

/// Header normalized for pattern matching
///
/// Lowercases and turns `_`, `.` and repeated whitespace into single spaces:
/// `"Persons_tested.RDT <5yrs"` becomes `"persons tested rdt <5yrs"`.
#[must_use]
pub fn normalize_header(name: &str) -> String {
    name.to_lowercase()
        .replace(['_', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Header reduced to its alphanumeric characters (`"Ward_Name"` → `"wardname"`)
#[must_use]
pub fn compact_header(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Index of the first column whose compact header equals one of `hints`
///
/// Hints are tried in order, so earlier hints take priority over later ones.
#[must_use]
pub fn find_column(batch: &RecordBatch, hints: &[&str]) -> Option<usize> {
    let schema = batch.schema();
    let headers: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| compact_header(field.name()))
        .collect();
    hints
        .iter()
        .find_map(|hint| headers.iter().position(|header| header == hint))
}
